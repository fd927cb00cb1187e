use std::error::Error;

use crate::cli::ThemeArg;
use crate::core::store::{PersistentState, ThemeMode};

/// The theme after applying `arg` to `current`.
pub fn next_theme(current: ThemeMode, arg: ThemeArg) -> ThemeMode {
    match arg {
        ThemeArg::Dark => ThemeMode::Dark,
        ThemeArg::Light => ThemeMode::Light,
        ThemeArg::Toggle => current.toggled(),
    }
}

pub fn set_theme(state: &PersistentState, arg: Option<ThemeArg>) -> Result<(), Box<dyn Error>> {
    let current = state.load_theme();
    let Some(arg) = arg else {
        println!("Current theme: {current}");
        println!("Available: dark, light");
        return Ok(());
    };

    let theme = next_theme(current, arg);
    state.save_theme(theme)?;
    println!("✅ Theme set to: {theme}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_modes_override_and_toggle_flips() {
        assert_eq!(next_theme(ThemeMode::Light, ThemeArg::Dark), ThemeMode::Dark);
        assert_eq!(next_theme(ThemeMode::Dark, ThemeArg::Light), ThemeMode::Light);
        assert_eq!(next_theme(ThemeMode::Dark, ThemeArg::Toggle), ThemeMode::Light);
    }

    #[test]
    fn setting_persists_to_the_store() {
        let state = PersistentState::in_memory();
        set_theme(&state, Some(ThemeArg::Toggle)).unwrap();
        assert_eq!(state.load_theme(), ThemeMode::Light);
        set_theme(&state, None).unwrap();
        assert_eq!(state.load_theme(), ThemeMode::Light);
    }
}
