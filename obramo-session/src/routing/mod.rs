//! Routing module — flow selection and the navigation host

pub mod route;
pub mod screens;
pub mod host;

pub use host::{NavigationHost, Navigator, NavigatorAction, RecordingNavigator};
pub use route::{select_flow, NavigationFlow};
pub use screens::ScreenTree;
