use std::io::{self, BufRead, Write};

use tabled::Table;

use crate::{
    cli::auth::open_store,
    config, error,
    types::{Credentials, StatusTableRow},
    success,
    utils::mask_string,
};

/// Stores client credentials, prompting for values not given as flags.
pub async fn setup(
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
) {
    let mut store = open_store().await;
    let current = store.credentials().clone();

    let client_id = client_id.unwrap_or_else(|| prompt("Client ID", &current.client_id));
    let client_secret =
        client_secret.unwrap_or_else(|| prompt("Client secret", &current.client_secret));
    let default_redirect = if current.redirect_uri.is_empty() {
        config::DEFAULT_REDIRECT_URI.to_string()
    } else {
        current.redirect_uri.clone()
    };
    let redirect_uri = redirect_uri.unwrap_or_else(|| prompt("Redirect URI", &default_redirect));

    let credentials = Credentials::new(client_id, client_secret, redirect_uri);
    if !credentials.is_configured() {
        error!("Client ID and client secret must not be empty.");
    }
    if let Err(e) = credentials.redirect_url() {
        error!("{}", e);
    }

    store.set_credentials(credentials);
    if let Err(e) = store.persist().await {
        error!("Failed to save credentials: {}", e);
    }
    success!("Credentials saved.");
}

/// Prints the effective client credentials, masked, and which environment
/// keys override the stored values.
pub async fn show() {
    let store = open_store().await;
    let stored = store.credentials();
    let effective = config::overlay_credentials(stored);
    let overrides = config::credential_overrides();

    let rows = vec![
        StatusTableRow {
            field: "Client ID".into(),
            value: mask_string(&effective.client_id),
        },
        StatusTableRow {
            field: "Client secret".into(),
            value: mask_string(&effective.client_secret),
        },
        StatusTableRow {
            field: "Redirect URI".into(),
            value: if stored.redirect_uri.is_empty() && config::redirect_uri().is_none() {
                format!("{} (default)", effective.redirect_uri)
            } else {
                effective.redirect_uri.clone()
            },
        },
        StatusTableRow {
            field: "Source".into(),
            value: if overrides.is_empty() {
                "credential store".into()
            } else {
                format!("environment ({})", overrides.join(", "))
            },
        },
    ];
    println!("{}", Table::new(rows));
}

/// Reads one line from stdin; empty input keeps `current`.
fn prompt(label: &str, current: &str) -> String {
    let hint = if current.is_empty() {
        String::new()
    } else if label == "Redirect URI" {
        format!(" [{current}]")
    } else {
        format!(" [{}]", mask_string(current))
    };
    print!("{label}{hint}: ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return current.to_string();
    }
    match line.trim() {
        "" => current.to_string(),
        value => value.to_string(),
    }
}
