use serde::{Deserialize, Serialize};

pub const DISH1_HEADER: &str = "🍽️ Gerecht 1";
pub const DISH2_HEADER: &str = "🍽️ Gerecht 2";
pub const SOUP_HEADER: &str = "🥣 Soep";
const PRICE_PREFIX: &str = "Prijs: €";

/// Section headers paired with the label dish photos use to refer to them.
pub const SECTIONS: [(&str, &str); 3] = [
    (DISH1_HEADER, "Gerecht 1"),
    (DISH2_HEADER, "Gerecht 2"),
    (SOUP_HEADER, "Soep"),
];

/// The six fields of the menu entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuForm {
    pub dish1: String,
    pub price1: String,
    pub dish2: String,
    pub price2: String,
    pub soup: String,
    pub price_soup: String,
}

impl MenuForm {
    pub fn is_blank(&self) -> bool {
        [
            &self.dish1,
            &self.price1,
            &self.dish2,
            &self.price2,
            &self.soup,
            &self.price_soup,
        ]
        .iter()
        .all(|f| f.trim().is_empty())
    }

    /// Render the form into the stored `items` text.
    pub fn to_items(&self) -> String {
        format!(
            "{DISH1_HEADER}\n{}\n{PRICE_PREFIX} {}\n\n{DISH2_HEADER}\n{}\n{PRICE_PREFIX} {}\n\n{SOUP_HEADER}\n{}\n{PRICE_PREFIX} {}",
            one_line(&self.dish1),
            one_line(&self.price1),
            one_line(&self.dish2),
            one_line(&self.price2),
            one_line(&self.soup),
            one_line(&self.price_soup),
        )
    }

    /// Recover the form fields from stored `items`. Missing headers give empty fields.
    pub fn from_items(items: &str) -> Self {
        let lines: Vec<&str> = items.lines().collect();
        Self {
            dish1: find_dish(&lines, DISH1_HEADER),
            price1: find_price(&lines, DISH1_HEADER),
            dish2: find_dish(&lines, DISH2_HEADER),
            price2: find_price(&lines, DISH2_HEADER),
            soup: find_dish(&lines, SOUP_HEADER),
            price_soup: find_price(&lines, SOUP_HEADER),
        }
    }
}

fn one_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn header_index(lines: &[&str], header: &str) -> Option<usize> {
    lines.iter().position(|l| l.contains(header))
}

fn find_dish(lines: &[&str], header: &str) -> String {
    header_index(lines, header)
        .and_then(|idx| lines.get(idx + 1))
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}

// The price line sits within the three lines following its header.
fn find_price(lines: &[&str], header: &str) -> String {
    let Some(idx) = header_index(lines, header) else {
        return String::new();
    };
    lines
        .iter()
        .skip(idx + 1)
        .take(3)
        .find(|l| l.contains(PRICE_PREFIX))
        .map(|l| l.replace(PRICE_PREFIX, "").trim().to_string())
        .unwrap_or_default()
}

/// A display block of a menu. `label` is `None` for menus that predate the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub label: Option<String>,
    pub body: String,
}

/// Split stored menu text into labelled sections, or one unlabelled block when
/// any of the template headers is missing.
pub fn sections(items: &str) -> Vec<MenuSection> {
    if !SECTIONS.iter().all(|(header, _)| items.contains(header)) {
        return vec![MenuSection {
            label: None,
            body: items.trim().to_string(),
        }];
    }

    SECTIONS
        .iter()
        .enumerate()
        .map(|(i, (header, label))| {
            let after = items.split_once(header).map(|(_, rest)| rest).unwrap_or("");
            let body = match SECTIONS.get(i + 1) {
                Some((next, _)) => after.split(next).next().unwrap_or(""),
                None => after,
            };
            MenuSection {
                label: Some((*label).to_string()),
                body: body.trim().to_string(),
            }
        })
        .collect()
}

/// Whether stored menu text says anything beyond the empty template.
pub fn has_content(items: &str) -> bool {
    sections(items)
        .iter()
        .any(|section| !section.body.replace(PRICE_PREFIX, "").trim().is_empty())
}
