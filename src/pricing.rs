//! Ticket pricing: the published tier table and the per-ticket quote used
//! when a booked ticket is shown for payment.

use std::fmt;

use serde::Serialize;

/// Minimum age of the person making a booking.
pub const MIN_BOOKING_AGE: u32 = 18;

/// Base amount (INR) of the per-ticket payment quote.
const QUOTE_BASE_INR: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketTier {
    Adult,
    Child,
    Senior,
    Student,
    Infant,
}

impl TicketTier {
    /// Display order of the published price list.
    pub const ALL: [TicketTier; 5] = [
        TicketTier::Adult,
        TicketTier::Child,
        TicketTier::Senior,
        TicketTier::Student,
        TicketTier::Infant,
    ];

    /// Tier for a visitor of `age`. Students must say so; age alone never
    /// selects the student tier.
    pub fn for_age(age: u32, student: bool) -> Self {
        match age {
            0..=4 => TicketTier::Infant,
            5..=17 if student => TicketTier::Student,
            5..=17 => TicketTier::Child,
            60.. => TicketTier::Senior,
            _ if student => TicketTier::Student,
            _ => TicketTier::Adult,
        }
    }

    pub fn price_inr(self) -> u32 {
        match self {
            TicketTier::Adult => 150,
            TicketTier::Child => 80,
            TicketTier::Senior => 100,
            TicketTier::Student => 60,
            TicketTier::Infant => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketTier::Adult => "Adult (18+)",
            TicketTier::Child => "Child (5-17)",
            TicketTier::Senior => "Senior Citizen (60+)",
            TicketTier::Student => "Student (with ID)",
            TicketTier::Infant => "Infant (below 5)",
        }
    }
}

impl fmt::Display for TicketTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price_inr() {
            0 => write!(f, "{}: Free", self.label()),
            p => write!(f, "{}: ₹{}", self.label(), p),
        }
    }
}

/// Optional services sold alongside tickets.
pub const ADD_ONS: [(&str, &str); 4] = [
    ("Audio Guide", "₹50/device"),
    ("VR Experience", "₹100/person"),
    ("Photography Pass", "₹200/group"),
    ("Guided Tour", "₹300/group"),
];

/// Bullet list of tier prices, one per line.
pub fn price_list() -> String {
    TicketTier::ALL
        .iter()
        .map(|t| format!("• {t}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn add_on_list() -> String {
    ADD_ONS
        .iter()
        .map(|(name, price)| format!("• {name}: {price}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketQuote {
    pub age: u32,
    /// Amount due in INR.
    pub amount: f64,
    pub can_book: bool,
    pub tier: TicketTier,
    /// Public reference of the ticket being paid for, when one was named.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
}

impl TicketQuote {
    /// Attach the public reference of stored ticket `ticket_id`.
    pub fn for_ticket(mut self, ticket_id: u32) -> Self {
        self.booking_id = Some(booking_id(ticket_id));
        self
    }
}

/// Payment quote for one ticket: half price under 12, 70% from 60.
/// `student` only affects the reported tier, not the amount.
pub fn quote(age: u32, student: bool) -> TicketQuote {
    let amount = if age < 12 {
        QUOTE_BASE_INR * 0.5
    } else if age >= 60 {
        QUOTE_BASE_INR * 0.7
    } else {
        QUOTE_BASE_INR
    };
    TicketQuote {
        age,
        amount,
        can_book: age >= MIN_BOOKING_AGE,
        tier: TicketTier::for_age(age, student),
        booking_id: None,
    }
}

/// Public booking reference for a stored ticket id, e.g. `MUS240042`.
pub fn booking_id(ticket_id: u32) -> String {
    format!("MUS24{ticket_id:04}")
}
