//! Plugins: reusable bundles of interceptors.
//!
//! A plugin is applied once to the instance it is registered on, and again
//! to every instance later derived from it with [`Client::create`].

use crate::Client;

/// Initializer that attaches interceptors (and any private state they share)
/// to a client instance.
///
/// Any `Fn(&Client) + Send + Sync + 'static` is a plugin:
///
/// ```ignore
/// use hookline::{Client, interceptor::request_fn};
///
/// client.use_plugin(|client: &Client| {
///     client.intercept_request(request_fn(|config| async move {
///         Ok(config.header("X-Client", "hookline"))
///     }));
/// });
/// ```
pub trait Plugin: Send + Sync + 'static {
    /// Register this plugin's behavior on `client`.
    ///
    /// Called once per instance; state created here is private to that
    /// instance.
    fn apply(&self, client: &Client);
}

impl<F> Plugin for F
where
    F: Fn(&Client) + Send + Sync + 'static,
{
    fn apply(&self, client: &Client) {
        self(client);
    }
}
