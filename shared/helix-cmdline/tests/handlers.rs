use std::any::TypeId;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use helix_cmdline::{
    ApplicationState, AsyncCommandHandler, BoundOptions, CmdlineError, CommandDefinition,
    CommandHandler, CommandLine, CommandLineBuilder, CommandNode, ExecutionOutcome,
    FromServices, OptionSpec, ServiceProvider, ServiceResolver, SharedService,
};
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Repository {
    remotes: Vec<&'static str>,
}

struct ListRemotes {
    repository: Arc<Repository>,
    state: Arc<ApplicationState>,
}

impl CommandDefinition for ListRemotes {
    const NAME: &'static str = "remotes";

    fn configure(command: &mut CommandNode) {
        command
            .about("List remotes")
            .alias("r")
            .option(OptionSpec::multiple("skip").long("skip"));
    }
}

impl FromServices for ListRemotes {
    fn from_services(services: &ServiceResolver<'_>) -> anyhow::Result<Self> {
        Ok(Self {
            repository: services.require()?,
            state: services.require()?,
        })
    }
}

impl CommandHandler for ListRemotes {
    fn execute(self, services: &ServiceResolver<'_>) -> anyhow::Result<i32> {
        let options = services.require::<BoundOptions>()?;
        let skipped = options.values("skip");
        let shown = self
            .repository
            .remotes
            .iter()
            .filter(|r| !skipped.iter().any(|s| s == *r))
            .count();
        let bonus = if self.state.verbose { 100 } else { 0 };
        Ok(i32::try_from(shown)? + bonus)
    }
}

struct Fetch {
    retries: u32,
}

impl CommandDefinition for Fetch {
    const NAME: &'static str = "fetch";
}

impl FromServices for Fetch {
    fn from_services(services: &ServiceResolver<'_>) -> anyhow::Result<Self> {
        Ok(Self {
            retries: *services.require::<u32>()?,
        })
    }
}

#[async_trait(?Send)]
impl AsyncCommandHandler for Fetch {
    async fn execute(self, services: &ServiceResolver<'_>) -> anyhow::Result<i32> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        let level = services.state().log_level().as_i32();
        Ok(i32::try_from(self.retries)? * 10 + level)
    }
}

struct Missing;

impl FromServices for Missing {
    fn from_services(services: &ServiceResolver<'_>) -> anyhow::Result<Self> {
        services.require::<Repository>()?;
        Ok(Self)
    }
}

impl CommandHandler for Missing {
    fn execute(self, _services: &ServiceResolver<'_>) -> anyhow::Result<i32> {
        Ok(0)
    }
}

struct Host {
    retries: u32,
}

impl ServiceProvider for Host {
    fn get_service(&self, service: TypeId) -> Option<SharedService> {
        (service == TypeId::of::<u32>()).then(|| Arc::new(self.retries) as SharedService)
    }
}

fn line(host_builds: &Arc<AtomicUsize>) -> CommandLine {
    let mut builder = CommandLineBuilder::new("git");
    builder
        .add_service(Repository {
            remotes: vec!["origin", "upstream", "fork"],
        })
        .add_service(3_u32);
    let builds = Arc::clone(host_builds);
    builder.service_provider_factory(move |state| {
        builds.fetch_add(1, Ordering::SeqCst);
        Host {
            retries: if state.debug { 9 } else { 5 },
        }
    });
    builder.add_command::<ListRemotes>();
    builder.add_async_command::<Fetch>();
    builder.command("broken", |c| {
        c.handler::<Missing>();
    });
    builder.build().expect("builds")
}

#[test]
fn test_typed_handler_gets_registered_services_and_state() {
    let builds = Arc::new(AtomicUsize::new(0));
    let line = line(&builds);

    assert_eq!(line.execute(["remotes"]).expect("runs"), Some(3));
    assert_eq!(line.execute(["r", "--skip", "fork", "--skip", "origin"]).expect("runs"), Some(1));
    assert_eq!(line.execute(["remotes", "-v"]).expect("runs"), Some(103));
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let remotes = line.root().subcommand("remotes").expect("added");
    assert_eq!(remotes.description(), Some("List remotes"));
    assert!(remotes.handler_type().is_some_and(|t| t.ends_with("ListRemotes")));
}

#[test]
fn test_async_handler_blocks_in_sync_execute() {
    let builds = Arc::new(AtomicUsize::new(0));
    let line = line(&builds);

    // Registered u32 wins over the host's.
    assert_eq!(line.execute(["fetch", "-l", "warning"]).expect("runs"), Some(33));
}

#[tokio::test]
async fn test_async_handler_on_caller_runtime() {
    let builds = Arc::new(AtomicUsize::new(0));
    let line = line(&builds);

    assert_eq!(line.execute_async(["fetch", "-d"]).await.expect("runs"), Some(31));
    assert_eq!(line.execute_async(["--help"]).await.expect("help"), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sync_execute_inside_multi_thread_runtime() {
    let builds = Arc::new(AtomicUsize::new(0));
    let line = line(&builds);

    assert_eq!(line.execute(["fetch", "-l", "warning"]).expect("runs"), Some(33));
    assert_eq!(line.run(["fetch", "-d"]), 31);
}

#[tokio::test]
async fn test_sync_execute_inside_current_thread_runtime_is_an_error() {
    let builds = Arc::new(AtomicUsize::new(0));
    let line = line(&builds);

    let err = line.execute(["fetch"]).unwrap_err();
    assert!(matches!(&err, CmdlineError::NestedRuntime(command) if command == "git fetch"));
    assert_eq!(line.run(["fetch"]), 10);

    // Synchronous handlers are unaffected.
    assert_eq!(line.execute(["remotes"]).expect("runs"), Some(3));
}

#[test]
fn test_host_provider_is_built_lazily_per_execution() {
    let builds = Arc::new(AtomicUsize::new(0));
    let mut builder = CommandLineBuilder::new("git");
    let counter = Arc::clone(&builds);
    builder.service_provider_factory(move |state| {
        counter.fetch_add(1, Ordering::SeqCst);
        Host {
            retries: if state.debug { 9 } else { 5 },
        }
    });
    builder.add_async_command::<Fetch>();
    builder.command("noop", |c| {
        c.on_execute(|_| 0);
    });
    let line = builder.build().expect("builds");

    assert_eq!(line.execute(["noop"]).expect("runs"), Some(0));
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    assert_eq!(line.execute(["fetch", "-d"]).expect("runs"), Some(91));
    assert_eq!(line.execute(["fetch"]).expect("runs"), Some(52));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_missing_service_fails_the_handler() {
    let builds = Arc::new(AtomicUsize::new(0));
    let mut builder = CommandLineBuilder::new("git");
    builder.service_provider_factory(move |_| {
        builds.fetch_add(1, Ordering::SeqCst);
        Host { retries: 1 }
    });
    builder.command("broken", |c| {
        c.handler::<Missing>();
    });
    let line = builder.build().expect("builds");

    let err = line.execute(["broken"]).unwrap_err();
    assert!(matches!(&err, CmdlineError::Handler { command, .. } if command == "git broken"));
    let source = err.user_error().expect("source kept");
    assert!(matches!(
        source.downcast_ref::<CmdlineError>(),
        Some(CmdlineError::ServiceNotFound(name)) if name.ends_with("Repository")
    ));
}

#[test]
fn test_typed_default_command() {
    struct Greet;

    impl FromServices for Greet {
        fn from_services(_services: &ServiceResolver<'_>) -> anyhow::Result<Self> {
            Ok(Self)
        }
    }

    impl CommandHandler for Greet {
        fn execute(self, services: &ServiceResolver<'_>) -> anyhow::Result<i32> {
            Ok(if services.state().is_default_command() { 11 } else { 0 })
        }
    }

    let mut builder = CommandLineBuilder::new("hello");
    builder.default_command::<Greet>();
    let line = builder.build().expect("builds");

    assert_eq!(line.execute(Vec::<String>::new()).expect("runs"), Some(11));
    assert_eq!(
        line.execute_outcome(["run"]).expect("runs"),
        ExecutionOutcome::Completed(11)
    );
}
