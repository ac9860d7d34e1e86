//! Authentication state trait and macro.

/// Trait for handler states whose routes sit behind the request gate.
pub trait HasAuthBackend {
    /// Where unauthenticated requests are sent.
    fn login_path(&self) -> &str;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have a `routes: Arc<RoutePolicy>` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub routes: Arc<RoutePolicy>,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn login_path(&self) -> &str {
                &self.routes.login_path
            }
        }
    };
}
