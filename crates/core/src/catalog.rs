//! The restaurant menu: a static lookup table the ordering flow validates
//! against. Item names are matched case-insensitively, with an edit-distance
//! fallback so small typos still resolve to the intended dish.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency marker used wherever an amount is rendered for a guest.
pub const CURRENCY: &str = "₹";

/// Typos within this edit distance silently resolve to the catalog title.
const AUTO_ACCEPT_DISTANCE: usize = 2;

/// Beyond `AUTO_ACCEPT_DISTANCE` but within this bound, the nearest title is
/// offered as a suggestion instead of being assumed.
const SUGGESTION_DISTANCE: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: Decimal,
}

/// Outcome of resolving a guest-supplied item name against the menu.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemMatch<'a> {
    Exact(&'a MenuItem),
    NearMiss { item: &'a MenuItem, distance: usize },
    Unknown { suggestion: Option<&'a MenuItem> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Menu {
    items: Vec<MenuItem>,
}

impl Menu {
    pub fn new(items: Vec<MenuItem>) -> Menu {
        Menu { items }
    }

    /// The resort's standing menu.
    pub fn standard() -> Menu {
        fn item(name: &str, cents: i64) -> MenuItem {
            MenuItem { name: name.to_string(), price: Decimal::new(cents, 2) }
        }
        Menu::new(vec![
            item("Margherita Pizza", 1200),
            item("Grilled Salmon", 1850),
            item("Caesar Salad", 950),
            item("Club Sandwich", 1000),
            item("French Fries", 450),
            item("Tomato Soup", 600),
            item("Chocolate Cake", 700),
            item("Fresh Juice", 500),
            item("Coffee", 350),
        ])
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Case-insensitive exact lookup.
    pub fn find(&self, name: &str) -> Option<&MenuItem> {
        let wanted = name.trim().to_ascii_lowercase();
        self.items.iter().find(|item| item.name.to_ascii_lowercase() == wanted)
    }

    /// Resolves a free-text item name: exact match, then nearest title by
    /// edit distance.
    pub fn resolve(&self, name: &str) -> ItemMatch<'_> {
        if let Some(item) = self.find(name) {
            return ItemMatch::Exact(item);
        }
        let wanted = name.trim().to_ascii_lowercase();
        let nearest = self
            .items
            .iter()
            .map(|item| (item, levenshtein(&wanted, &item.name.to_ascii_lowercase())))
            .min_by_key(|(_, distance)| *distance);
        match nearest {
            Some((item, distance)) if distance <= AUTO_ACCEPT_DISTANCE => {
                ItemMatch::NearMiss { item, distance }
            }
            Some((item, distance)) if distance <= SUGGESTION_DISTANCE => {
                ItemMatch::Unknown { suggestion: Some(item) }
            }
            _ => ItemMatch::Unknown { suggestion: None },
        }
    }

    /// Guest-facing menu text.
    pub fn formatted(&self) -> String {
        let mut out = String::from("Here is our menu:\n");
        for item in &self.items {
            out.push_str(&format!("- {}: {}{}\n", item.name, CURRENCY, item.price));
        }
        out.push_str("Tell me the items and quantities you would like.");
        out
    }
}

/// Plain Levenshtein distance over characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
