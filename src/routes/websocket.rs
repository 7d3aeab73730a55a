use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use crate::{
    services::{changefeed, metrics::WS_CONNECTIONS_GAUGE},
    AppState,
};

/// GET /ws: read-only insert notifications for every board table
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        WS_CONNECTIONS_GAUGE.inc();
        info!("WebSocket connected");
        handle_socket(socket, state).await;
        WS_CONNECTIONS_GAUGE.dec();
    })
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Dedicated pub/sub connection per client
    let mut pubsub = match state.redis_client.get_async_pubsub().await {
        Ok(c) => c,
        Err(e) => {
            error!("Redis pubsub error: {}", e);
            return;
        }
    };

    for channel in changefeed::channels() {
        if let Err(e) = pubsub.subscribe(&channel).await {
            error!("Redis subscribe error on {}: {}", channel, e);
            return;
        }
    }

    // Redis Pub/Sub → WebSocket
    let mut redis_task = tokio::spawn(async move {
        let mut pubsub_stream = pubsub.on_message();
        while let Some(msg) = pubsub_stream.next().await {
            let Some(ws_msg) = changefeed::notification(msg.get_channel_name()) else {
                continue;
            };
            if sender
                .send(Message::Text(ws_msg.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Clients only listen; drain until they close.
    let mut client_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => debug!("Ignoring WS message: {}", text.as_str()),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut redis_task) => client_task.abort(),
        _ = (&mut client_task) => redis_task.abort(),
    }

    info!("WebSocket disconnected");
}
