use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::ports::{ServiceProvider, SharedService};

#[derive(Clone)]
struct Registration {
    id: TypeId,
    type_name: &'static str,
    service: SharedService,
}

/// Values registered on the builder; consulted before the host provider.
#[derive(Clone, Default)]
pub struct ServiceCollection {
    registrations: Vec<Registration>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service`, replacing an earlier registration of the same type.
    pub fn add<T: Any + Send + Sync>(&mut self, service: T) -> &mut Self {
        self.add_shared(Arc::new(service))
    }

    pub fn add_shared<T: Any + Send + Sync>(&mut self, service: Arc<T>) -> &mut Self {
        let id = TypeId::of::<T>();
        self.registrations.retain(|r| r.id != id);
        self.registrations.push(Registration {
            id,
            type_name: type_name::<T>(),
            service,
        });
        self
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_service(TypeId::of::<T>())
            .and_then(|service| service.downcast::<T>().ok())
    }

    pub fn contains<T: Any>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.registrations.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl ServiceProvider for ServiceCollection {
    fn get_service(&self, service: TypeId) -> Option<SharedService> {
        self.registrations
            .iter()
            .find(|r| r.id == service)
            .map(|r| Arc::clone(&r.service))
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.registrations.iter().map(|r| r.type_name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Endpoint(&'static str);

    #[test]
    fn test_later_registration_replaces_earlier() {
        let mut services = ServiceCollection::new();
        services.add(Endpoint("first")).add(Endpoint("second")).add(42_u16);

        assert_eq!(services.len(), 2);
        assert_eq!(*services.get::<Endpoint>().expect("registered"), Endpoint("second"));
        assert_eq!(services.get::<u16>().as_deref(), Some(&42));
        assert!(services.get::<String>().is_none());
        assert!(services.contains::<u16>());
    }

    #[test]
    fn test_debug_lists_type_names() {
        let mut services = ServiceCollection::new();
        services.add(7_u8);
        assert_eq!(format!("{services:?}"), "[\"u8\"]");
    }
}
