use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use super::{PhysicalConsole, ServiceCollection};
use crate::domain::{ApplicationState, BoundOptions};
use crate::error::{CmdlineError, Result};
use crate::ports::{ServiceProvider, SharedService};

pub(crate) type ProviderFactory =
    dyn Fn(&ApplicationState) -> Arc<dyn ServiceProvider> + Send + Sync;

/// Resolves handler dependencies for one execution.
///
/// Lookup order is fixed: the bound [`ApplicationState`] (and the selected
/// command's [`BoundOptions`]), the [`PhysicalConsole`] singleton, services
/// registered on the builder, then the host provider. The host provider is
/// built from the factory on first use and reused for the rest of the
/// execution.
pub struct ServiceResolver<'a> {
    state: Arc<ApplicationState>,
    options: Arc<BoundOptions>,
    registered: &'a ServiceCollection,
    factory: Option<&'a ProviderFactory>,
    host: OnceCell<Option<Arc<dyn ServiceProvider>>>,
}

impl<'a> ServiceResolver<'a> {
    pub(crate) fn new(
        state: Arc<ApplicationState>,
        options: Arc<BoundOptions>,
        registered: &'a ServiceCollection,
        factory: Option<&'a ProviderFactory>,
    ) -> Self {
        Self {
            state,
            options,
            registered,
            factory,
            host: OnceCell::new(),
        }
    }

    /// Uses `host` instead of building one from the factory.
    #[must_use]
    pub(crate) fn with_host(self, host: Option<Arc<dyn ServiceProvider>>) -> Self {
        if let Some(host) = host {
            let _ = self.host.set(Some(host));
        }
        self
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn options(&self) -> &BoundOptions {
        &self.options
    }

    pub fn console(&self) -> Arc<PhysicalConsole> {
        PhysicalConsole::shared()
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let id = TypeId::of::<T>();

        if id == TypeId::of::<ApplicationState>() {
            return downcast(Arc::clone(&self.state) as SharedService);
        }
        if id == TypeId::of::<BoundOptions>() {
            return downcast(Arc::clone(&self.options) as SharedService);
        }
        if id == TypeId::of::<PhysicalConsole>() {
            return downcast(PhysicalConsole::shared() as SharedService);
        }
        if let Some(service) = self.registered.get_service(id) {
            return downcast(service);
        }

        self.host()?.get_service(id).and_then(downcast::<T>)
    }

    /// Like [`get`](Self::get), but a missing service is an error naming the type.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get::<T>()
            .ok_or_else(|| CmdlineError::ServiceNotFound(type_name::<T>()))
    }

    fn host(&self) -> Option<&Arc<dyn ServiceProvider>> {
        self.host
            .get_or_init(|| {
                self.factory.map(|factory| {
                    debug!("Building host service provider");
                    factory(&self.state)
                })
            })
            .as_ref()
    }
}

fn downcast<T: Any + Send + Sync>(service: SharedService) -> Option<Arc<T>> {
    service.downcast::<T>().ok()
}
