use anyhow::Result;
use ratatui::{Frame, crossterm::event::KeyCode, layout::Rect};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{
    routes::{browser::BrowserRoute, log::LogRoute, playback::PlaybackRoute, queue::QueueRoute},
    state::AppState,
};
use cadenza_core::engine::AudioEngineHandle;

/// Trait that all routes must implement
/// This enables dynamic dispatch and polymorphic behavior
pub trait RouteHandler: std::fmt::Debug {
    /// Render this route's UI
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState);

    /// Handle keyboard input for this route
    /// Returns Ok(RouteAction) to indicate what should happen next
    fn handle_input(
        &mut self,
        key: KeyCode,
        state: &mut AppState,
        handle: &AudioEngineHandle,
    ) -> anyhow::Result<RouteAction>;

    /// Tab this route belongs to
    fn tab(&self) -> Tab;

    /// Optional: Called when entering this route
    fn on_enter(&mut self, _state: &mut AppState, _handle: &AudioEngineHandle) -> Result<()> {
        Ok(())
    }

    /// Optional: Called when leaving this route
    fn on_exit(&mut self, _state: &mut AppState, _handle: &AudioEngineHandle) -> Result<()> {
        Ok(())
    }

    /// Key hints shown in the controls bar
    fn help_items(&self, _state: &AppState) -> Vec<(&'static str, &'static str)> {
        vec![("Tab", "Switch Tab"), ("Q", "Quit")]
    }
}

/// Main tabs, in sidebar order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum Tab {
    Playback,
    Queue,
    Browser,
    Log,
}

impl Tab {
    pub fn route(self) -> Box<dyn RouteHandler> {
        match self {
            Tab::Playback => Box::new(PlaybackRoute),
            Tab::Queue => Box::new(QueueRoute),
            Tab::Browser => Box::new(BrowserRoute),
            Tab::Log => Box::new(LogRoute::new()),
        }
    }

    pub fn next(self) -> Tab {
        let tabs: Vec<Tab> = Tab::iter().collect();
        let idx = tabs.iter().position(|t| *t == self).unwrap_or(0);
        tabs[(idx + 1) % tabs.len()]
    }
}

/// Actions that can be returned from route handlers
#[derive(Debug)]
pub enum RouteAction {
    /// Do nothing, stay on current route
    None,
    /// Replace current route with a new one
    Replace(Box<dyn RouteHandler>),
    /// Quit the application
    Quit,
}

/// Router holds the active route and swaps it on tab changes
pub struct Router {
    current: Box<dyn RouteHandler>,
}

impl Router {
    pub fn new(initial_route: Box<dyn RouteHandler>) -> Self {
        Self {
            current: initial_route,
        }
    }

    pub fn current(&self) -> &dyn RouteHandler {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> &mut Box<dyn RouteHandler> {
        &mut self.current
    }

    /// Execute a route action, returns true when the app should quit
    pub fn execute_action(
        &mut self,
        action: RouteAction,
        state: &mut AppState,
        handle: &AudioEngineHandle,
    ) -> Result<bool> {
        match action {
            RouteAction::None => Ok(false),
            RouteAction::Replace(route) => {
                self.replace(route, state, handle)?;
                Ok(false)
            }
            RouteAction::Quit => Ok(true),
        }
    }

    /// Replace current route (useful for tab switching)
    pub fn replace(
        &mut self,
        mut new_route: Box<dyn RouteHandler>,
        state: &mut AppState,
        handle: &AudioEngineHandle,
    ) -> Result<()> {
        self.current.on_exit(state, handle)?;
        new_route.on_enter(state, handle)?;
        self.current = new_route;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_cycle_in_sidebar_order() {
        assert_eq!(Tab::Playback.next(), Tab::Queue);
        assert_eq!(Tab::Log.next(), Tab::Playback);
        assert_eq!(Tab::Browser.route().tab(), Tab::Browser);
    }
}
