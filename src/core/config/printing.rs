use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.default_provider {
            Some(provider) => println!("  default-provider: {provider}"),
            None => println!("  default-provider: (unset)"),
        }
        println!("  temperature: {}", self.temperature());
        match self.explain_code() {
            true => println!("  explain-code: on"),
            false => println!("  explain-code: off"),
        }
        match &self.data_dir {
            Some(dir) => println!("  data-dir: {}", path_display(dir)),
            None => println!("  data-dir: (default)"),
        }
        if self.custom_providers.is_empty() {
            println!("  custom-providers: (none)");
        } else {
            println!("  custom-providers:");
            for provider in &self.custom_providers {
                println!(
                    "    {} ({}): {} [{}]",
                    provider.id, provider.display_name, provider.endpoint, provider.model
                );
            }
        }
    }
}
