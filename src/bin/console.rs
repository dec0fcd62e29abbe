//! Interactive console variant of the booking manager. Drives the same
//! engine and journal as the HTTP server, one menu action at a time.

use std::io::{self, Write};
use std::sync::Arc;

use huddle::engine::{Engine, NoOverlap};
use huddle::model::Span;
use huddle::timeutil::{format_iso, now_ms, parse_console};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = std::env::var("HUDDLE_DATA_DIR").unwrap_or_else(|_| "./data".into());
    std::fs::create_dir_all(&data_dir)?;
    let journal_path = std::path::Path::new(&data_dir).join("bookings.journal");

    let engine = Arc::new(Engine::new(journal_path, Box::new(NoOverlap))?);

    loop {
        print_menu();
        match prompt("\nEnter your choice (1-8): ")?.as_str() {
            "1" => create_user(&engine).await?,
            "2" => list_users(&engine),
            "3" => create_room(&engine).await?,
            "4" => list_rooms(&engine).await,
            "5" => make_booking(&engine).await?,
            "6" => list_bookings(&engine).await,
            "7" => cancel_booking(&engine).await?,
            "8" => {
                println!("Goodbye!");
                return Ok(());
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}

fn print_menu() {
    println!("\n=== Meeting Room Booking System ===");
    println!("1. Create user");
    println!("2. List users");
    println!("3. Create room");
    println!("4. List rooms");
    println!("5. Make booking");
    println!("6. List bookings");
    println!("7. Cancel booking");
    println!("8. Exit");
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn create_user(engine: &Engine) -> io::Result<()> {
    println!("\n--- Create User ---");
    let name = prompt("Enter name: ")?;
    let email = prompt("Enter email: ")?;
    match engine.create_user(&name, &email).await {
        Ok(user) => println!("User created successfully: #{} {} <{}>", user.id, user.name, user.email),
        Err(e) => println!("Error: {e}"),
    }
    Ok(())
}

fn list_users(engine: &Engine) {
    println!("\n--- Users List ---");
    let users = engine.list_users();
    if users.is_empty() {
        println!("No users found.");
    }
    for user in users {
        println!("ID: {}, Name: {}, Email: {}", user.id, user.name, user.email);
    }
}

async fn create_room(engine: &Engine) -> io::Result<()> {
    println!("\n--- Create Room ---");
    let name = prompt("Enter room name: ")?;
    let capacity = prompt("Enter capacity: ")?;
    let Ok(capacity) = capacity.parse::<u32>() else {
        println!("Error: capacity must be a number");
        return Ok(());
    };
    let location = prompt("Enter location (optional): ")?;
    let location = (!location.is_empty()).then_some(location);
    match engine.create_room(&name, capacity, location).await {
        Ok(room) => println!("Room created successfully: #{} {}", room.id, room.name),
        Err(e) => println!("Error: {e}"),
    }
    Ok(())
}

async fn list_rooms(engine: &Engine) {
    println!("\n--- Rooms List ---");
    let rooms = engine.list_rooms().await;
    if rooms.is_empty() {
        println!("No rooms found.");
    }
    for room in rooms {
        println!(
            "ID: {}, Name: {}, Capacity: {}, Location: {}",
            room.id,
            room.name,
            room.capacity,
            room.location.as_deref().unwrap_or("-")
        );
    }
}

async fn make_booking(engine: &Engine) -> io::Result<()> {
    println!("\n--- Make Booking ---");

    let users = engine.list_users();
    if users.is_empty() {
        println!("No users available. Create a user first.");
        return Ok(());
    }
    println!("Available users:");
    for user in &users {
        println!("ID: {}, Name: {}", user.id, user.name);
    }

    let rooms = engine.list_rooms().await;
    if rooms.is_empty() {
        println!("No rooms available. Create a room first.");
        return Ok(());
    }
    println!("\nAvailable rooms:");
    for room in &rooms {
        println!("ID: {}, Name: {}", room.id, room.name);
    }

    let Ok(user_id) = prompt("\nEnter user ID: ")?.parse::<u64>() else {
        println!("Error: user ID must be a number");
        return Ok(());
    };
    let Ok(room_id) = prompt("Enter room ID: ")?.parse::<u64>() else {
        println!("Error: room ID must be a number");
        return Ok(());
    };
    let Some(start) = parse_console(&prompt("Enter start time (YYYY-MM-DD HH:MM): ")?) else {
        println!("Error: invalid date format. Use YYYY-MM-DD HH:MM.");
        return Ok(());
    };
    let Some(end) = parse_console(&prompt("Enter end time (YYYY-MM-DD HH:MM): ")?) else {
        println!("Error: invalid date format. Use YYYY-MM-DD HH:MM.");
        return Ok(());
    };

    // Console-level input hygiene, not a core invariant.
    if start <= now_ms() {
        println!("Error: start time must be in the future");
        return Ok(());
    }
    if start >= end {
        println!("Error: start time must be before end time");
        return Ok(());
    }

    match engine.create_booking(room_id, user_id, Span::new(start, end)).await {
        Ok(booking) => println!(
            "Booking created successfully: #{} ({} -> {})",
            booking.id,
            format_iso(booking.span.start),
            format_iso(booking.span.end)
        ),
        Err(e) => println!("Error: {e}"),
    }
    Ok(())
}

async fn list_bookings(engine: &Engine) {
    println!("\n--- Bookings List ---");
    let bookings = engine.all_bookings().await;
    if bookings.is_empty() {
        println!("No bookings found.");
    }
    for booking in bookings {
        println!(
            "ID: {}, User: {}, Room: {}, Start: {}, End: {}",
            booking.id,
            booking.user_id,
            booking.room_id,
            format_iso(booking.span.start),
            format_iso(booking.span.end)
        );
    }
}

async fn cancel_booking(engine: &Engine) -> io::Result<()> {
    println!("\n--- Cancel Booking ---");

    let bookings = engine.all_bookings().await;
    if bookings.is_empty() {
        println!("No bookings found.");
        return Ok(());
    }
    println!("Current bookings:");
    for booking in &bookings {
        println!(
            "ID: {}, User: {}, Room: {}, Start: {}, End: {}",
            booking.id,
            booking.user_id,
            booking.room_id,
            format_iso(booking.span.start),
            format_iso(booking.span.end)
        );
    }

    let Ok(booking_id) = prompt("\nEnter booking ID to cancel: ")?.parse::<u64>() else {
        println!("Error: booking ID must be a number");
        return Ok(());
    };
    match engine.cancel_booking(booking_id).await {
        Ok(true) => println!("Booking cancelled successfully!"),
        Ok(false) => println!("Error: no booking with ID {booking_id}"),
        Err(e) => println!("Error: {e}"),
    }
    Ok(())
}
