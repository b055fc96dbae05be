/// Middleware modules for the web server
///
/// - `session`: Session cookie handling and current-user resolution

pub mod session;
