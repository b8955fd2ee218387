//! Reply content: the button table, rule handlers and the fallback reply.

use rand::seq::SliceRandom;

use super::{ChatReply, DialogueContext, NavAction};
use crate::pricing;

pub const BTN_LOGIN: &str = "btn_login";
pub const BTN_REGISTER: &str = "btn_register";
pub const BTN_BOOK_TICKETS: &str = "btn_book_tickets";
pub const BTN_VIEW_TICKETS: &str = "btn_view_tickets";
pub const BTN_CANCEL_TICKET: &str = "btn_cancel_ticket";
pub const BTN_PRICING_INFO: &str = "btn_pricing_info";
pub const BTN_MUSEUM_INFO: &str = "btn_museum_info";
pub const BTN_MAIN_MENU: &str = "btn_main_menu";

pub const GREETINGS: [&str; 3] = [
    "Hello! Welcome to MuseumHub 🏛️",
    "Hi there! Welcome to our museum booking assistant!",
    "Hey! Great to see you at MuseumHub!",
];

pub const FAREWELLS: [&str; 3] = [
    "Thank you for visiting MuseumHub! Have a wonderful day! 🏛️",
    "Goodbye! We hope to see you at the museum soon! 👋",
    "Thanks for chatting with me! Enjoy your museum experience! ✨",
];

fn pick(pool: &[&'static str]) -> &'static str {
    pool.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

/// Direct reply for a button id, if the id is known.
pub fn button(id: &str) -> Option<ChatReply> {
    let reply = match id {
        BTN_LOGIN => ChatReply::new(
            "Great! Please click the login button below to access your account.",
        )
        .navigate(NavAction::RedirectLogin),
        BTN_REGISTER => ChatReply::new(
            "Welcome to MuseumHub! Please click the register button below to create your account.",
        )
        .navigate(NavAction::RedirectRegister),
        BTN_BOOK_TICKETS => ChatReply::new(
            "Excellent! Let me guide you to our ticket booking page where you can select your preferred date and tickets.",
        )
        .navigate(NavAction::RedirectBooking),
        BTN_VIEW_TICKETS => {
            ChatReply::new("Here are your booked tickets. You can view, download, or print them.")
                .navigate(NavAction::RedirectMyTickets)
        }
        BTN_CANCEL_TICKET => ChatReply::new(
            "I can help you cancel your ticket. Please note that cancellation is allowed within 48 hours of booking.",
        )
        .button(BTN_VIEW_TICKETS, "View My Tickets")
        .button(BTN_MAIN_MENU, "Main Menu"),
        BTN_PRICING_INFO => {
            ChatReply::new(format!("Here's our pricing information:\n{}", pricing::price_list()))
                .button(BTN_BOOK_TICKETS, "Book Tickets")
                .button(BTN_MAIN_MENU, "Main Menu")
        }
        BTN_MUSEUM_INFO => ChatReply::new(
            "Museum Information:\n• Hours: 9:00 AM - 6:00 PM (Daily)\n• Location: Culture Street, Art District\n• Contact: +91 98765 43210\n• Facilities: Audio Guide, VR Experience, Photography allowed",
        )
        .button(BTN_BOOK_TICKETS, "Book Tickets")
        .button(BTN_MAIN_MENU, "Main Menu"),
        BTN_MAIN_MENU => ChatReply::new("What would you like to do?")
            .button(BTN_BOOK_TICKETS, "🎫 Book Tickets")
            .button(BTN_VIEW_TICKETS, "📋 My Tickets")
            .button(BTN_PRICING_INFO, "💰 Pricing")
            .button(BTN_MUSEUM_INFO, "🏛️ Museum Info"),
        _ => return None,
    };
    Some(reply)
}

pub fn greeting(ctx: &DialogueContext) -> ChatReply {
    let greeting = pick(&GREETINGS);
    if ctx.logged_in {
        ChatReply::new(format!("{greeting}\n\nWelcome back! What would you like to do today?"))
            .button(BTN_BOOK_TICKETS, "🎫 Book New Tickets")
            .button(BTN_VIEW_TICKETS, "📋 My Tickets")
            .button(BTN_MUSEUM_INFO, "🏛️ Museum Info")
            .button(BTN_PRICING_INFO, "💰 Pricing")
    } else {
        ChatReply::new(format!("{greeting}\n\nTo get started, please choose an option:"))
            .button(BTN_LOGIN, "🔐 Login")
            .button(BTN_REGISTER, "✨ Register")
            .button(BTN_MUSEUM_INFO, "🏛️ Museum Info")
            .button(BTN_PRICING_INFO, "💰 View Pricing")
    }
}

pub fn help(_: &DialogueContext) -> ChatReply {
    ChatReply::new(
        "I'm here to help you with your museum visit! I can assist you with:\n\n• Ticket booking and management\n• Pricing information\n• Museum details and timings\n• Policies and guidelines\n\nWhat would you like to know more about?",
    )
    .button(BTN_BOOK_TICKETS, "🎫 Book Tickets")
    .button(BTN_PRICING_INFO, "💰 Pricing")
    .button(BTN_MUSEUM_INFO, "🏛️ Museum Info")
    .button(BTN_VIEW_TICKETS, "📋 My Tickets")
}

pub fn booking(ctx: &DialogueContext) -> ChatReply {
    if ctx.logged_in {
        ChatReply::new(
            "Perfect! I'd love to help you book tickets. Our booking system allows you to:\n\n• Choose your visit date\n• Select ticket types and quantities\n• Add optional services (Audio guide, VR experience)\n• Make secure payment\n\nReady to start booking?",
        )
        .button(BTN_BOOK_TICKETS, "🎫 Start Booking")
        .button(BTN_PRICING_INFO, "💰 View Pricing First")
    } else {
        ChatReply::new(
            "I'd be happy to help you book tickets! However, you'll need to login or create an account first to proceed with booking.\n\nWould you like to:",
        )
        .button(BTN_LOGIN, "🔐 Login to Existing Account")
        .button(BTN_REGISTER, "✨ Create New Account")
        .button(BTN_PRICING_INFO, "💰 View Pricing First")
    }
}

pub fn login(_: &DialogueContext) -> ChatReply {
    ChatReply::new("Great! If you already have an account, please click below to login:")
        .button(BTN_LOGIN, "🔐 Login Now")
        .button(BTN_REGISTER, "✨ Create Account Instead")
}

pub fn register(_: &DialogueContext) -> ChatReply {
    ChatReply::new(
        "Welcome to MuseumHub! Creating an account is quick and easy. You'll be able to:\n\n• Book tickets online\n• Manage your bookings\n• View booking history\n• Get exclusive offers\n\nReady to join us?",
    )
    .button(BTN_REGISTER, "✨ Create Account")
    .button(BTN_LOGIN, "🔐 Login to Existing Account")
}

pub fn view_tickets(ctx: &DialogueContext) -> ChatReply {
    if ctx.logged_in {
        ChatReply::new(
            "Let me show you your tickets. You can view, download, print, or manage your bookings.",
        )
        .button(BTN_VIEW_TICKETS, "📋 View My Tickets")
        .button(BTN_BOOK_TICKETS, "🎫 Book More Tickets")
    } else {
        ChatReply::new("To view your tickets, please login to your account first:")
            .button(BTN_LOGIN, "🔐 Login")
            .button(BTN_REGISTER, "✨ Create Account")
    }
}

pub fn cancel(_: &DialogueContext) -> ChatReply {
    ChatReply::new(
        "I can help you with ticket cancellation. Please note our cancellation policy:\n\n• Cancellation allowed within 48 hours of booking\n• No refund if you miss your scheduled visit\n• Processing may take 3-5 business days\n\nWould you like to view your tickets to proceed with cancellation?",
    )
    .button(BTN_VIEW_TICKETS, "📋 View My Tickets")
    .button(BTN_MAIN_MENU, "🏠 Main Menu")
}

pub fn pricing(_: &DialogueContext) -> ChatReply {
    ChatReply::new(format!(
        "Here's our current pricing:\n\n🎫 **Ticket Prices:**\n{}\n\n🎯 **Add-on Services:**\n{}",
        pricing::price_list(),
        pricing::add_on_list()
    ))
    .button(BTN_BOOK_TICKETS, "🎫 Book Now")
    .button(BTN_MAIN_MENU, "🏠 Main Menu")
}

pub fn timings(_: &DialogueContext) -> ChatReply {
    ChatReply::new(
        "🕒 Museum Timings:\n• Open: 9:00 AM\n• Close: 5:00 PM\n• Last Entry: 4:30 PM\n\nLet me know if you'd like to book tickets!",
    )
    .button(BTN_BOOK_TICKETS, "🎫 Book Tickets")
    .button(BTN_MAIN_MENU, "🏠 Main Menu")
}

pub fn contact(_: &DialogueContext) -> ChatReply {
    ChatReply::new(
        "📍 **Museum Location & Contact:**\n\n🏛️ MuseumHub\n123 Culture Street, Art District\nCity, State - 123456\n\n📞 Phone: +91 98765 43210\n📧 Email: info@museumhub.com\n🌐 Website: www.museumhub.com",
    )
    .button(BTN_BOOK_TICKETS, "🎫 Book Tickets")
    .button(BTN_MAIN_MENU, "🏠 Main Menu")
}

pub fn services(_: &DialogueContext) -> ChatReply {
    ChatReply::new(
        "🏛️ **Our Services:**\n\n✅ **Available Services:**\n• Online ticket booking\n• Audio guides in multiple languages\n• VR experiences\n• Guided tours\n• Photography permissions\n• Wheelchair accessibility\n• Gift shop\n• Cafeteria\n\n🎯 **Digital Services:**\n• Mobile tickets\n• Online cancellation\n• Booking history\n• Email notifications",
    )
    .button(BTN_BOOK_TICKETS, "🎫 Book Tickets")
    .button(BTN_PRICING_INFO, "💰 View Pricing")
    .button(BTN_MAIN_MENU, "🏠 Main Menu")
}

pub fn policies(_: &DialogueContext) -> ChatReply {
    ChatReply::new(format!(
        "📋 **Museum Policies:**\n\n🔸 **Booking Rules:**\n• Minimum age for booking: {} years\n• One booking per person at a time\n• Valid ID required at entry\n\n🔸 **Cancellation Policy:**\n• Cancel within 48 hours of booking\n• No refund for missed visits\n• Processing time: 3-5 business days\n\n🔸 **Visit Guidelines:**\n• Arrive 15 minutes before your slot\n• No outside food or drinks\n• Photography rules apply\n• Follow museum etiquette",
        pricing::MIN_BOOKING_AGE
    ))
    .button(BTN_BOOK_TICKETS, "🎫 Book Tickets")
    .button(BTN_MAIN_MENU, "🏠 Main Menu")
}

pub fn goodbye(_: &DialogueContext) -> ChatReply {
    ChatReply::new(pick(&FAREWELLS))
        .button(BTN_MAIN_MENU, "🏠 Start Over")
        .button(BTN_BOOK_TICKETS, "🎫 Quick Book")
}

/// Reply for anything the bot does not recognise.
pub fn fallback() -> ChatReply {
    ChatReply::new(
        "I'm not quite sure about that, but I'm here to help! I can assist you with:\n\n• Booking museum tickets\n• Viewing your tickets\n• Pricing information\n• Museum details and policies\n\nWhat would you like to know more about?",
    )
    .button(BTN_BOOK_TICKETS, "🎫 Book Tickets")
    .button(BTN_VIEW_TICKETS, "📋 My Tickets")
    .button(BTN_MUSEUM_INFO, "🏛️ Museum Info")
    .button(BTN_PRICING_INFO, "💰 Pricing")
}
