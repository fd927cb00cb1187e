use std::error::Error;

use crate::core::config::Config;
use crate::core::providers::{CredentialSource, EnvCredentials, ProviderRegistry};

pub fn provider_table<S: CredentialSource>(registry: &ProviderRegistry, credentials: &S) -> String {
    let default_id = registry.default_provider().id.clone();
    let rows: Vec<[String; 5]> = registry
        .providers()
        .iter()
        .map(|provider| {
            let id = if provider.id.eq_ignore_ascii_case(&default_id) {
                format!("{}*", provider.id)
            } else {
                provider.id.clone()
            };
            let key_status = if credentials.api_key(provider).is_some() {
                "✅".to_string()
            } else {
                format!("❌ {}", provider.api_key_env)
            };
            [
                id,
                provider.display_name.clone(),
                provider.model.clone(),
                provider.endpoint.clone(),
                key_status,
            ]
        })
        .collect();

    let headers = ["Provider", "Display Name", "Model", "Endpoint", "API Key"];
    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::from("Available Providers:\n\n");
    out.push_str(&format_row(&headers.map(str::to_string)));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out.push_str("\n* = default provider");
    out
}

pub fn list_providers(config: &Config) -> Result<(), Box<dyn Error>> {
    let registry = ProviderRegistry::from_config(config);
    println!("{}", provider_table(&registry, &EnvCredentials));
    Ok(())
}
