use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use booking_cell::models::{AppointmentType, DoctorRef, HospitalRef};
use booking_cell::services::BookingWorkflow;
use shared_config::AppConfig;
use shared_platform::PlatformClient;
use token_cell::services::TokenAvailabilityService;

const USAGE: &str = "usage: booking-console <doctor-uuid> <hospital-uuid> <YYYY-MM-DD> \
[--capacity N] [--doctor-name NAME] [--hospital-name NAME] \
[--book TOKEN] [--type TYPE] [--notes TEXT]";

struct CliArgs {
    doctor_id: Uuid,
    hospital_id: Uuid,
    date: NaiveDate,
    capacity: u32,
    doctor_name: String,
    hospital_name: String,
    book: Option<u32>,
    appointment_type: AppointmentType,
    notes: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args(env::args().skip(1))?;

    let config = AppConfig::from_env();
    if !config.is_configured() {
        bail!("PLATFORM_API_URL and PLATFORM_API_KEY must be set");
    }

    match args.book {
        Some(token_number) => book_token(&config, &args, token_number).await,
        None => print_board(&config, &args).await,
    }
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut positional: Vec<String> = Vec::new();
    let mut capacity = 20u32;
    let mut doctor_name = "Doctor".to_string();
    let mut hospital_name = "Clinic".to_string();
    let mut book = None;
    let mut appointment_type = AppointmentType::Consultation;
    let mut notes = None;

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--capacity" => {
                capacity = flag_value(&mut raw, "--capacity")?
                    .parse()
                    .context("--capacity must be a positive number")?;
            }
            "--doctor-name" => doctor_name = flag_value(&mut raw, "--doctor-name")?,
            "--hospital-name" => hospital_name = flag_value(&mut raw, "--hospital-name")?,
            "--book" => {
                book = Some(
                    flag_value(&mut raw, "--book")?
                        .parse()
                        .context("--book must be a token number")?,
                );
            }
            "--type" => appointment_type = flag_value(&mut raw, "--type")?.parse()?,
            "--notes" => notes = Some(flag_value(&mut raw, "--notes")?),
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown flag {other}\n{USAGE}"),
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() != 3 {
        bail!("{USAGE}");
    }
    if capacity == 0 {
        bail!("--capacity must be at least 1");
    }

    Ok(CliArgs {
        doctor_id: positional[0].parse().context("doctor id must be a UUID")?,
        hospital_id: positional[1].parse().context("hospital id must be a UUID")?,
        date: positional[2].parse().context("date must be YYYY-MM-DD")?,
        capacity,
        doctor_name,
        hospital_name,
        book,
        appointment_type,
        notes,
    })
}

fn flag_value(raw: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    raw.next().with_context(|| format!("{flag} needs a value\n{USAGE}"))
}

/// Print the token board for one doctor-hospital-day.
async fn print_board(config: &AppConfig, args: &CliArgs) -> Result<()> {
    let platform = Arc::new(PlatformClient::new(config));
    let resolver = TokenAvailabilityService::new(platform);
    let board = resolver
        .resolve(args.doctor_id, args.hospital_id, args.date, args.capacity)
        .await;

    if let Some(warning) = board.warning() {
        warn!("{}", warning.message);
    }

    println!("Token board for doctor {} on {}", args.doctor_id, args.date);
    for slot in &board.slots {
        let state = if slot.is_booked {
            match &slot.holder_label {
                Some(holder) => format!("booked ({holder})"),
                None => "booked".to_string(),
            }
        } else {
            "available".to_string()
        };
        println!("  #{:<3} {:>8}  {}", slot.token_number, slot.display_time, state);
    }
    println!("{} of {} tokens booked", board.booked_count(), board.slots.len());

    Ok(())
}

/// Drive the whole workflow for one token and submit it.
async fn book_token(config: &AppConfig, args: &CliArgs, token_number: u32) -> Result<()> {
    info!(
        "Booking token {} for doctor {} on {}",
        token_number, args.doctor_id, args.date
    );

    let mut workflow = BookingWorkflow::new(config);

    workflow.select_doctor(DoctorRef {
        id: args.doctor_id,
        name: args.doctor_name.clone(),
    });
    workflow.advance()?;
    workflow.select_hospital(HospitalRef {
        id: args.hospital_id,
        name: args.hospital_name.clone(),
        daily_token_capacity: args.capacity,
    })?;
    workflow.advance()?;
    workflow.select_date(args.date)?;
    workflow.refresh_availability().await;
    if let Some(warning) = workflow.availability_warning() {
        warn!("{}", warning.message);
    }
    workflow.advance()?;
    workflow.select_token(token_number)?;
    workflow.advance()?;
    workflow.select_appointment_type(args.appointment_type)?;
    workflow.set_notes(args.notes.clone());
    workflow.advance()?;

    let confirmation = workflow.confirm().await.context("booking failed")?;

    println!(
        "Booked token {} as appointment {} ({}) for {}",
        confirmation.token_number,
        confirmation.appointment_id,
        confirmation.status,
        confirmation.appointment_timestamp
    );

    Ok(())
}
