mod cli;

use clap::Parser;
use clearance_registry::{
    error::{self, AppError},
    server,
    storage::{Database, Role},
    utils,
    verification::{EligibilityChecker, UploadedImage},
    Config,
};
use cli::{Cli, Commands};
use colored::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clearance_registry=debug,tower_http=info,info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => {
            info!("Starting API server on {}", config.bind_address());
            server::serve(config).await
        }

        Commands::Init => initialize(&config),

        Commands::Stats { format } => show_stats(&config, &format),

        Commands::Users { format } => list_users(&config, &format),

        Commands::Promote { email } => promote(&config, &email),

        Commands::Offences { user_id, format } => list_offences(&config, user_id, &format),

        Commands::Verify {
            user_id,
            image_name,
            image_size,
        } => verify(&config, user_id, UploadedImage::new(image_name, image_size)),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing clearance registry...".green());
    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());
    println!("\n{}", "Configuration:".cyan());
    println!("  Listen:         {}", config.bind_address());
    println!("  Database:       {}", config.database.path);
    println!("  Providers:      {}", config.auth.providers.join(", "));
    if config.server.allowed_origins.is_empty() {
        println!("  CORS origins:   any");
    } else {
        println!("  CORS origins:   {}", config.server.allowed_origins.join(", "));
    }

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to start the API", "clearance serve".yellow());
    println!("  {} to view statistics", "clearance stats".yellow());
    Ok(())
}

fn show_stats(config: &Config, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let stats = db.get_stats()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== Clearance Registry Statistics ===".cyan().bold());
    println!("\nUsers:");
    println!("  Total:          {}", stats.total_users);
    println!("  Fingerprinted:  {}", stats.total_fingerprints.to_string().green());
    println!("  With offences:  {}", stats.users_with_offences.to_string().red());

    println!("\nRecords:");
    println!("  Offences:       {}", stats.total_offences.to_string().yellow());
    println!("  Clearances:     {}", stats.total_clearances.to_string().cyan());
    Ok(())
}

fn list_users(config: &Config, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let users = db.list_users()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("{}", "No registered users".yellow());
        return Ok(());
    }

    let widths = [6, 24, 32, 8, 24];
    utils::print_table_border(102);
    utils::print_table_row(&["ID", "Name", "Email", "Role", "Registered"], &widths);
    utils::print_table_border(102);
    for user in &users {
        utils::print_table_row(
            &[
                &user.id.to_string(),
                &utils::truncate(&user.name, 24),
                &utils::truncate(&user.email, 32),
                &user.role.to_string(),
                &utils::format_timestamp(&user.timestamp),
            ],
            &widths,
        );
    }
    utils::print_table_border(102);
    println!("Total: {}", users.len());
    Ok(())
}

fn promote(config: &Config, email: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    db.set_user_role(email, Role::Admin)?;
    info!("Promoted {} to admin", email);
    println!("{}", format!("✓ {} is now an admin", email).green());
    Ok(())
}

fn list_offences(config: &Config, user_id: i64, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let user = db
        .get_user(user_id)?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
    let offences = db.get_offences_by_user(user_id)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&offences)?);
        return Ok(());
    }

    if offences.is_empty() {
        println!("{}", format!("No offences recorded for {}", user.name).green());
        return Ok(());
    }

    println!("{}", format!("Offences recorded for {}:", user.name).yellow());
    let widths = [6, 24, 60];
    utils::print_table_border(94);
    utils::print_table_row(&["ID", "Date", "Details"], &widths);
    utils::print_table_border(94);
    for offence in &offences {
        utils::print_table_row(
            &[
                &offence.id.to_string(),
                &utils::format_timestamp(&offence.offence_date),
                &utils::truncate(&offence.offence_details, 60),
            ],
            &widths,
        );
    }
    utils::print_table_border(94);
    Ok(())
}

fn verify(config: &Config, user_id: i64, upload: UploadedImage) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    db.get_user(user_id)?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    println!(
        "{}",
        format!(
            "Verifying user {} against {} ({})",
            user_id,
            upload.image_name,
            utils::format_size(upload.image_size)
        )
        .cyan()
    );

    let eligibility = EligibilityChecker::new(&db).check(user_id, &upload)?;

    println!("  Image match:    {}", eligibility.image_match);
    println!("  Has offences:   {}", eligibility.has_offences);
    if eligibility.is_eligible {
        println!("{}", format!("✓ {}", eligibility.verdict).green());
    } else {
        println!("{}", format!("✗ {}", eligibility.verdict).red());
    }
    Ok(())
}
