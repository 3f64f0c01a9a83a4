//! # Business Command
//!
//! ```bash
//! portal business list
//! portal business select 7
//! portal business current
//! portal business clear
//! ```

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;
use crate::errors::{display_auth_error, display_session_error, display_success};
use crate::exit_codes::*;
use crate::session::EntityId;

use super::{build_client, print_json, report};

/// Business subcommands
#[derive(Debug, Clone)]
pub enum BusinessAction {
    /// List the user's businesses
    List { json: bool },
    /// Make a business the current context
    Select { id: String },
    /// Show the current context
    Current { json: bool },
    /// Forget the current context
    Clear,
}

/// Execute a business subcommand
pub async fn execute(action: BusinessAction) -> Result<i32> {
    let client = build_client()?;
    run(&client, action).await
}

pub(crate) async fn run(client: &ApiClient, action: BusinessAction) -> Result<i32> {
    match action {
        BusinessAction::List { json } => list(client, json).await,
        BusinessAction::Select { id } => Ok(select(client, &id).await),
        BusinessAction::Current { json } => current(client, json),
        BusinessAction::Clear => Ok(match client.clear_business() {
            Ok(()) => {
                display_success("Business selection cleared");
                EXIT_SUCCESS
            }
            Err(e) => {
                display_session_error(&e.to_string());
                EXIT_SESSION_ERROR
            }
        }),
    }
}

async fn list(client: &ApiClient, json: bool) -> Result<i32> {
    let businesses = match client.list_businesses().await {
        Ok(businesses) => businesses,
        Err(e) => return Ok(report(&e)),
    };

    if json {
        print_json(&businesses)?;
        return Ok(EXIT_SUCCESS);
    }

    if businesses.is_empty() {
        println!("{}", "No businesses yet.".dimmed());
        return Ok(EXIT_SUCCESS);
    }

    let selected = client.selected_business().ok().flatten().map(|b| b.id);
    for business in &businesses {
        let marker = if selected.as_ref() == Some(&business.id) {
            "*".green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:>6}  {}",
            marker,
            business.id.to_string().dimmed(),
            business.name
        );
    }
    Ok(EXIT_SUCCESS)
}

async fn select(client: &ApiClient, id: &str) -> i32 {
    if !client.session().is_authenticated() {
        display_auth_error("Not logged in");
        return EXIT_AUTH_ERROR;
    }

    let business = match client.business(&EntityId::from(id)).await {
        Ok(business) => business,
        Err(e) => return report(&e),
    };

    match client.select_business(&business) {
        Ok(context) => {
            display_success(&format!("Now acting for {}", context.name.bold()));
            EXIT_SUCCESS
        }
        Err(e) => {
            display_session_error(&e.to_string());
            EXIT_SESSION_ERROR
        }
    }
}

fn current(client: &ApiClient, json: bool) -> Result<i32> {
    let selected = match client.selected_business() {
        Ok(selected) => selected,
        Err(e) => {
            display_session_error(&e.to_string());
            return Ok(EXIT_SESSION_ERROR);
        }
    };

    if json {
        print_json(&selected)?;
        return Ok(EXIT_SUCCESS);
    }

    match selected {
        Some(business) => println!("{} ({})", business.name.bold(), business.id),
        None => println!("{}", "No business selected.".dimmed()),
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{MockServer, reply};
    use crate::session::SessionContext;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_select_fetches_and_stores() {
        let server = MockServer::start(reply(
            StatusCode::OK,
            r#"{"id":7,"name":"Acme Bakery"}"#,
        ))
        .await;
        let session = SessionContext::in_memory();
        session.establish("abc123", None).unwrap();
        let client = ApiClient::new(server.url(), session.clone());

        let code = run(&client, BusinessAction::Select { id: "7".to_string() })
            .await
            .unwrap();

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(server.requests()[0].path, "/businesses/7");
        assert_eq!(
            session.selected_business().unwrap().map(|b| b.id),
            Some(EntityId::Number(7))
        );
    }

    #[tokio::test]
    async fn test_select_missing_business() {
        let server = MockServer::start(reply(
            StatusCode::NOT_FOUND,
            r#"{"message":"Business not found"}"#,
        ))
        .await;
        let session = SessionContext::in_memory();
        session.establish("abc123", None).unwrap();
        let client = ApiClient::new(server.url(), session.clone());

        let code = run(&client, BusinessAction::Select { id: "9".to_string() })
            .await
            .unwrap();

        assert_eq!(code, EXIT_INVALID_INPUT);
        assert!(session.is_authenticated());
        assert_eq!(session.selected_business().unwrap(), None);
    }

    #[tokio::test]
    async fn test_select_requires_session() {
        let client = ApiClient::new("http://127.0.0.1:1", SessionContext::in_memory());

        let code = run(&client, BusinessAction::Select { id: "7".to_string() })
            .await
            .unwrap();

        assert_eq!(code, EXIT_AUTH_ERROR);
    }

    #[tokio::test]
    async fn test_clear_without_selection() {
        let client = ApiClient::new("http://127.0.0.1:1", SessionContext::in_memory());

        assert_eq!(run(&client, BusinessAction::Clear).await.unwrap(), EXIT_SUCCESS);
        assert_eq!(
            run(&client, BusinessAction::Current { json: false })
                .await
                .unwrap(),
            EXIT_SUCCESS
        );
    }
}
