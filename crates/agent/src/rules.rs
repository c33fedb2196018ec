//! Keyword-driven intent parsing: the always-available strategy, and the
//! fallback behind the model-backed one.
//!
//! Matching is word-based with plural tolerance ("pizzas" hits "pizza"),
//! not substring-based, so short keywords like "spa" do not fire inside
//! "spare". Departments are scanned in a fixed order (restaurant, room
//! service, reception) and every match is kept, so one message can fan out
//! to several departments.

use concierge_core::{Menu, RequestType, RoomNumber};

use crate::intent::{
    clamp_quantity, follow_up_request, DepartmentRequest, IntentParser, ParseContext, ParseSource,
    ParsedIntent, RequestedItem, RestaurantSlots, RoomServiceSlots, RULE_CONFIDENCE,
};

const RESTAURANT_KEYWORDS: &[&str] = &[
    "food",
    "order",
    "menu",
    "coffee",
    "tea",
    "juice",
    "drink",
    "snack",
    "breakfast",
    "lunch",
    "dinner",
    "restaurant",
    "pizza",
    "fries",
    "burger",
    "sandwich",
    "salad",
    "soup",
    "dessert",
    "cake",
];

const ROOM_SERVICE_KEYWORDS: &[&str] = &[
    "clean",
    "cleaning",
    "cleaned",
    "housekeeping",
    "tidy",
    "vacuum",
    "laundry",
    "wash",
    "washing",
    "towel",
    "pillow",
    "blanket",
    "amenity",
    "amenities",
    "toiletries",
    "toothpaste",
    "toothbrush",
    "soap",
    "shampoo",
    "room service",
];

const RECEPTION_KEYWORDS: &[&str] = &[
    "check-in",
    "check in",
    "checkin",
    "check-out",
    "check out",
    "checkout",
    "gym",
    "fitness",
    "workout",
    "spa",
    "massage",
    "sauna",
    "pool",
    "swim",
    "swimming",
    "availability",
    "available",
    "vacancy",
    "vacancies",
    "reception",
    "front desk",
    "book a room",
];

/// Menu-name words too generic to identify a dish on their own. "fresh
/// towels" must not read as a Fresh Juice order.
const GENERIC_NAME_WORDS: &[&str] = &["fresh", "grilled", "french", "club"];

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

#[derive(Clone, Debug)]
pub struct RuleBasedParser {
    menu: Menu,
}

impl RuleBasedParser {
    pub fn new(menu: Menu) -> RuleBasedParser {
        RuleBasedParser { menu }
    }

    fn parse_message(&self, message: &str, context: &ParseContext) -> ParsedIntent {
        let lowered = message.to_ascii_lowercase();
        let words = tokenize(&lowered);

        let items = extract_items(&words, &self.menu);
        let menu_requested = wants_menu(&words);

        let mut requests = Vec::new();
        if matches_any(&lowered, &words, RESTAURANT_KEYWORDS) || !items.is_empty() {
            requests.push(DepartmentRequest::Restaurant(RestaurantSlots { items, menu_requested }));
        }
        if matches_any(&lowered, &words, ROOM_SERVICE_KEYWORDS) {
            requests.push(DepartmentRequest::RoomService(RoomServiceSlots {
                request_type: RequestType::from_phrase(&lowered),
            }));
        }
        if matches_any(&lowered, &words, RECEPTION_KEYWORDS) {
            requests.push(DepartmentRequest::Reception);
        }
        if requests.is_empty() {
            if let Some(department) = context.last_department {
                requests.push(follow_up_request(department));
            }
        }

        let room_number = extract_room(&words).or_else(|| context.room_number.clone());

        ParsedIntent { requests, room_number, confidence: RULE_CONFIDENCE, source: ParseSource::RuleBased }
    }
}

impl Default for RuleBasedParser {
    fn default() -> RuleBasedParser {
        RuleBasedParser::new(Menu::standard())
    }
}

#[async_trait::async_trait]
impl IntentParser for RuleBasedParser {
    async fn parse(&self, message: &str, context: &ParseContext) -> ParsedIntent {
        self.parse_message(message, context)
    }

    fn mode(&self) -> &'static str {
        "rule_based"
    }
}

fn tokenize(lowered: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(lowered.len());
    for character in lowered.chars() {
        if character.is_ascii_alphanumeric() {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

/// Word equality with plural tolerance: "towels" matches "towel".
fn word_matches(word: &str, token: &str) -> bool {
    word == token || word.strip_suffix('s') == Some(token)
}

/// Keywords containing spaces or hyphens are matched as phrases against the
/// raw text; single words are matched token-by-token.
fn matches_any(lowered: &str, words: &[String], keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.chars().all(|character| character.is_ascii_alphanumeric()) {
            words.iter().any(|word| word_matches(word, keyword))
        } else {
            lowered.contains(keyword)
        }
    })
}

fn is_distinctive(token: &str) -> bool {
    token.len() > 3 && !GENERIC_NAME_WORDS.contains(&token)
}

/// Locates a menu item in the word list: the full name in sequence first,
/// then any single distinctive word of it. Returns the matched word range
/// so quantity extraction can look at the neighbours.
fn find_item_span(words: &[String], name: &str) -> Option<(usize, usize)> {
    let name_tokens = tokenize(&name.to_ascii_lowercase());
    if name_tokens.is_empty() {
        return None;
    }

    if words.len() >= name_tokens.len() {
        for start in 0..=(words.len() - name_tokens.len()) {
            let sequence_matches = name_tokens
                .iter()
                .enumerate()
                .all(|(offset, token)| word_matches(&words[start + offset], token));
            if sequence_matches {
                return Some((start, start + name_tokens.len()));
            }
        }
    }

    for (index, word) in words.iter().enumerate() {
        if name_tokens.iter().any(|token| is_distinctive(token) && word_matches(word, token)) {
            return Some((index, index + 1));
        }
    }
    None
}

fn number_word(word: &str) -> Option<u32> {
    NUMBER_WORDS.iter().find(|(name, _)| *name == word).map(|(_, value)| *value)
}

/// Parses "2", "two", "x2" or "2x" into a count.
fn parse_count(word: &str) -> Option<u32> {
    if let Some(value) = number_word(word) {
        return Some(value);
    }
    let digits = word.strip_prefix('x').or_else(|| word.strip_suffix('x')).unwrap_or(word);
    digits.parse::<u32>().ok().filter(|value| *value > 0)
}

/// A count directly before or after the matched item name, tolerating a
/// separating "x" ("2 x pizza", "pizza x 2").
fn quantity_near(words: &[String], span: (usize, usize)) -> Option<u32> {
    let (start, end) = span;

    let mut before = start;
    if before > 0 && words[before - 1] == "x" {
        before -= 1;
    }
    if before > 0 {
        if let Some(value) = parse_count(&words[before - 1]) {
            return Some(value);
        }
    }

    let mut after = end;
    if after < words.len() && words[after] == "x" {
        after += 1;
    }
    if after < words.len() {
        if let Some(value) = parse_count(&words[after]) {
            return Some(value);
        }
    }
    None
}

fn extract_items(words: &[String], menu: &Menu) -> Vec<RequestedItem> {
    let mut items = Vec::new();
    for item in menu.items() {
        if let Some(span) = find_item_span(words, &item.name) {
            let quantity = quantity_near(words, span).map(clamp_quantity).unwrap_or(1);
            items.push(RequestedItem { name: item.name.clone(), quantity });
        }
    }
    items
}

fn wants_menu(words: &[String]) -> bool {
    words.iter().any(|word| word_matches(word, "menu") || word_matches(word, "option"))
}

/// The explicit "room NNN" phrase wins; otherwise the first token in the
/// room-number format is taken.
fn extract_room(words: &[String]) -> Option<RoomNumber> {
    for (index, word) in words.iter().enumerate() {
        if word == "room" {
            if let Some(room) = words.get(index + 1).and_then(|next| RoomNumber::parse(next)) {
                return Some(room);
            }
        } else if let Some(digits) = word.strip_prefix("room") {
            if let Some(room) = RoomNumber::parse(digits) {
                return Some(room);
            }
        }
    }
    words.iter().find_map(|word| RoomNumber::parse(word))
}
