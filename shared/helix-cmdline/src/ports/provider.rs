use std::any::{Any, TypeId};
use std::sync::Arc;

pub type SharedService = Arc<dyn Any + Send + Sync>;

/// Host dependency-injection container consulted after built-in and explicit services.
pub trait ServiceProvider: Send + Sync {
    fn get_service(&self, service: TypeId) -> Option<SharedService>;
}

impl<P: ServiceProvider + ?Sized> ServiceProvider for Arc<P> {
    fn get_service(&self, service: TypeId) -> Option<SharedService> {
        (**self).get_service(service)
    }
}
