//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Which handler runs depends on the screen
//! currently mounted.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, LoginFocus, Screen, Tab, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.current_screen() {
        Screen::Disclaimer => Ok(handle_disclaimer_input(app, key)),
        Screen::News => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('c')) {
                app.dismiss_news();
            }
            Ok(false)
        }
        Screen::Loading => Ok(quit_requested(app, key)),
        Screen::Login => handle_login_input(app, key).await,
        Screen::Main => handle_main_input(app, key).await,
    }
}

fn quit_requested(app: &mut App, key: KeyEvent) -> bool {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        app.state = AppState::Quitting;
        return true;
    }
    false
}

fn handle_disclaimer_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter | KeyCode::Char('a') => {
            app.accept_disclaimer();
            false
        }
        _ => quit_requested(app, key),
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login.focus = app.login.focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login.focus = app.login.focus.prev();
        }
        KeyCode::Enter => match app.login.focus {
            LoginFocus::Button => app.attempt_login().await,
            _ => app.login.focus = app.login.focus.next(),
        },
        KeyCode::Backspace => app.login.pop(),
        KeyCode::Char(c) => app.login.push(c),
        _ => {}
    }
    Ok(false)
}

async fn handle_main_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('1') => app.current_tab = Tab::Queues,
        KeyCode::Char('2') => app.current_tab = Tab::Clock,
        KeyCode::Left | KeyCode::Right => app.current_tab = app.current_tab.next(),
        KeyCode::Char('r') => app.refresh_queues(),
        KeyCode::Char('L') => app.logout().await,
        _ if app.current_tab == Tab::Queues => handle_queues_input(app, key),
        _ => {}
    }
    Ok(false)
}

fn handle_queues_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') => app.toggle_sort(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.queue_selection = 0,
        KeyCode::End => app.queue_selection = app.queues.len().saturating_sub(1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bg1_core::auth::{CredentialStore, Lookup, MemoryCredentialStore};
    use bg1_core::config::Config;
    use bg1_core::kvdb::KvStore;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_input(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_fresh_install_walks_gates_then_login() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut app =
            App::with_parts(Config::default(), KvStore::in_memory(), store.clone(), true).unwrap();
        app.start_session().await.unwrap();

        assert_eq!(app.current_screen(), Screen::Disclaimer);
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.current_screen(), Screen::News);
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.current_screen(), Screen::Login);

        type_text(&mut app, "{MINNIE}").await;
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        type_text(&mut app, "m1nn13").await;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.login.focus, LoginFocus::Button);
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.current_screen(), Screen::Main);
        match store.get_data().unwrap() {
            Lookup::Valid(credential) => {
                assert_eq!(credential.subject, "{MINNIE}");
                assert_eq!(credential.access_token, "m1nn13");
            }
            Lookup::ReauthRequired => panic!("credential not persisted"),
        }
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_escape_on_login_quits() {
        let store = Arc::new(MemoryCredentialStore::new());
        let kv = KvStore::in_memory();
        let mut app = App::with_parts(Config::default(), kv, store, true).unwrap();
        app.accept_disclaimer();
        app.dismiss_news();
        app.start_session().await.unwrap();

        assert!(handle_input(&mut app, key(KeyCode::Esc)).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }
}
