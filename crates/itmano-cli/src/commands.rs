//! Command-line parsing and the handlers behind each command.

use anyhow::{anyhow, Result};
use itmano_core::models::{ContactMessage, NewsletterSubscription, RegisterForm};
use itmano_core::utils::format_date;
use itmano_core::{ApiClient, ApiError, Config, SessionManager, SessionState, TokenStore};
use tracing::{error, warn};

use crate::ui::prompt::{prompt_line, prompt_password};
use crate::ui::render_header;

/// Width of the service summary column
const SUMMARY_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Login { username: Option<String> },
    Register,
    Logout,
    Services { slug: Option<String> },
    Contact,
    Subscribe { email: String, name: Option<String> },
    Help,
}

impl Command {
    /// Parse the arguments following the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let command = match args.next() {
            None | Some("status") | Some("whoami") => Command::Status,
            Some("login") => Command::Login {
                username: args.next().map(str::to_string),
            },
            Some("register") => Command::Register,
            Some("logout") => Command::Logout,
            Some("services") => Command::Services {
                slug: args.next().map(str::to_string),
            },
            Some("contact") => Command::Contact,
            Some("subscribe") => {
                let email = args
                    .next()
                    .ok_or_else(|| anyhow!("Usage: itmano subscribe <email> [name]"))?
                    .to_string();
                let name = args.next().map(str::to_string);
                Command::Subscribe { email, name }
            }
            Some("help") | Some("-h") | Some("--help") => Command::Help,
            Some(other) => return Err(anyhow!("Unknown command '{}'. Try 'itmano help'.", other)),
        };
        Ok(command)
    }
}

pub const USAGE: &str = "\
Usage: itmano <command>

Commands:
  status             Show who is signed in (default)
  login [username]   Sign in
  register           Create an account
  logout             Sign out
  services [slug]    List services, or show one
  contact            Send a message to the team
  subscribe <email> [name]
                     Join the newsletter
  help               Show this message

Environment:
  ITMANO_API_URL     Backend address (default http://localhost:8000/api)
  ITMANO_USERNAME    Username for login
  ITMANO_PASSWORD    Password for login
  RUST_LOG           Log filter (e.g. RUST_LOG=debug)";

/// Everything a command handler may need
pub struct Context<'a> {
    pub config: &'a mut Config,
    pub api: &'a ApiClient,
    pub session: &'a SessionManager,
    pub store: &'a dyn TokenStore,
}

pub async fn run(command: Command, ctx: Context<'_>) -> Result<()> {
    match command {
        Command::Status => status(&ctx).await,
        Command::Login { username } => login(ctx, username).await,
        Command::Register => register(ctx).await,
        Command::Logout => logout(&ctx).await,
        Command::Services { slug } => services(&ctx, slug).await,
        Command::Contact => contact(&ctx).await,
        Command::Subscribe { email, name } => subscribe(&ctx, email, name).await,
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

/// Turn an API failure into the message the user sees
fn user_error(action: &str, e: ApiError) -> anyhow::Error {
    error!(error = %e, action, "Request failed");
    anyhow!(e.user_message())
}

async fn status(ctx: &Context<'_>) -> Result<()> {
    println!("{}", render_header(&ctx.session.session()));
    let user = match ctx.session.state() {
        SessionState::Authenticated(user) => user,
        SessionState::Anonymous => {
            println!("Not signed in");
            return Ok(());
        }
    };
    println!("Signed in as {}", user.name);

    // Profile details are optional extras; the session itself is already settled
    if let Some(token) = ctx.session.token() {
        match ctx.api.fetch_profile(&token).await {
            Ok(profile) => {
                if let Some(name) = profile.full_name() {
                    println!("Name: {}", name);
                }
                if let Some(email) = profile.email.as_deref().filter(|e| !e.is_empty()) {
                    println!("Email: {}", email);
                }
            }
            Err(e) => warn!(error = %e, "Failed to fetch profile details"),
        }
    }

    match ctx.store.saved_at() {
        Ok(Some(saved)) => println!("Token saved: {}", format_date(&saved)),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Failed to read token timestamp"),
    }
    Ok(())
}

async fn login(mut ctx: Context<'_>, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| std::env::var("ITMANO_USERNAME").ok()) {
        Some(u) => u,
        None => prompt_line("Username", ctx.config.last_username.as_deref())?,
    };
    let password = match std::env::var("ITMANO_PASSWORD") {
        Ok(p) => p,
        Err(_) => prompt_password("Password")?,
    };

    if username.is_empty() || password.is_empty() {
        return Err(anyhow!("Username and password required"));
    }

    let response = ctx
        .api
        .login(&username, &password)
        .await
        .map_err(|e| user_error("login", e))?;

    ctx.session
        .commit_login(response.token, response.username.clone())
        .await;

    ctx.config.last_username = Some(response.username.clone());
    if let Err(e) = ctx.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("{}", render_header(&ctx.session.session()));
    println!("Welcome back, {}!", response.username);
    Ok(())
}

async fn register(mut ctx: Context<'_>) -> Result<()> {
    let form = RegisterForm {
        email: prompt_line("Email", None)?,
        username: prompt_line("Username", None)?,
        password: prompt_password("Password")?,
        password2: prompt_password("Confirm password")?,
    };

    let response = ctx
        .api
        .register(&form)
        .await
        .map_err(|e| user_error("register", e))?;

    let username = response.username_or(&form.username).to_string();
    ctx.session.commit_login(response.token.clone(), username.clone()).await;

    ctx.config.last_username = Some(username.clone());
    if let Err(e) = ctx.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("{}", render_header(&ctx.session.session()));
    println!(
        "{}",
        response
            .message
            .as_deref()
            .unwrap_or("User registered successfully")
    );
    Ok(())
}

async fn logout(ctx: &Context<'_>) -> Result<()> {
    let was = ctx.session.current_user();
    ctx.session.logout().await;
    println!("{}", render_header(&ctx.session.session()));
    match was {
        Some(user) => println!("Goodbye, {}.", user.name),
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn services(ctx: &Context<'_>, slug: Option<String>) -> Result<()> {
    match slug {
        Some(slug) => {
            let service = ctx
                .api
                .fetch_service(&slug)
                .await
                .map_err(|e| user_error("fetch service", e))?;

            println!("{} ({})", service.title, service.slug.as_deref().unwrap_or(&slug));
            if let Some(ref category) = service.category_name {
                println!("Category: {}", category);
            }
            println!("Price: {}", service.price_display());
            if let Some(ref created) = service.created_at {
                println!("Listed: {}", format_date(created));
            }
            println!();
            println!("{}", service.description);
            if !service.features.is_empty() {
                println!();
                for feature in &service.features {
                    println!("  - {}", feature);
                }
            }
        }
        None => {
            let services = ctx.api.fetch_services().await.map_err(|e| {
                error!(error = %e, "Failed to fetch services");
                anyhow!("Failed to fetch services. Please try again later.")
            })?;

            if services.is_empty() {
                println!("No services listed yet.");
            }
            for service in &services {
                let marker = if service.is_featured { "*" } else { " " };
                println!(
                    "{}{:<24} {:<28} {}",
                    marker,
                    service.slug.as_deref().unwrap_or("-"),
                    service.title,
                    service.summary(SUMMARY_WIDTH)
                );
            }
        }
    }
    Ok(())
}

async fn contact(ctx: &Context<'_>) -> Result<()> {
    let default_name = ctx.session.current_user().map(|u| u.name);
    let message = ContactMessage {
        name: prompt_line("Name", default_name.as_deref())?,
        email: prompt_line("Email", None)?,
        phone: prompt_line("Phone (optional)", None)?,
        subject: prompt_line("Subject", None)?,
        message: prompt_line("Message", None)?,
    };

    let ack = ctx
        .api
        .submit_contact(&message)
        .await
        .map_err(|e| user_error("contact", e))?;

    println!(
        "{}",
        ack.as_deref()
            .unwrap_or("Thank you! Your message has been sent successfully.")
    );
    Ok(())
}

async fn subscribe(ctx: &Context<'_>, email: String, name: Option<String>) -> Result<()> {
    let subscription = NewsletterSubscription { email, name };
    let ack = ctx
        .api
        .subscribe_newsletter(&subscription)
        .await
        .map_err(|e| user_error("subscribe", e))?;

    match ack {
        Some(message) => println!("{}", message),
        None => println!("Subscribed {} to the newsletter.", subscription.email),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_default_is_status() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Status);
        assert_eq!(Command::parse(&args(&["whoami"])).unwrap(), Command::Status);
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            Command::parse(&args(&["login", "bob"])).unwrap(),
            Command::Login { username: Some("bob".to_string()) }
        );
        assert_eq!(
            Command::parse(&args(&["login"])).unwrap(),
            Command::Login { username: None }
        );
    }

    #[test]
    fn test_parse_services() {
        assert_eq!(
            Command::parse(&args(&["services"])).unwrap(),
            Command::Services { slug: None }
        );
        assert_eq!(
            Command::parse(&args(&["services", "web-development"])).unwrap(),
            Command::Services { slug: Some("web-development".to_string()) }
        );
    }

    #[test]
    fn test_parse_subscribe() {
        assert_eq!(
            Command::parse(&args(&["subscribe", "a@example.com"])).unwrap(),
            Command::Subscribe { email: "a@example.com".to_string(), name: None }
        );
        assert!(Command::parse(&args(&["subscribe"])).is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let err = Command::parse(&args(&["dance"])).unwrap_err();
        assert!(err.to_string().contains("Unknown command 'dance'"));
    }
}
