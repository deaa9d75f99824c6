//! Session lifecycle orchestration.
//!
//! This module decides what a `start` or `stop` actually does against the
//! live multiplexer: what already exists, what must be created, in what
//! order, and how the caller ends up attached. It drives two injected
//! capabilities, a [`SessionDriver`] for multiplexer operations and a
//! [`CommandRunner`] for setup/teardown shell commands, and never touches
//! the environment itself, so the whole decision tree is testable with
//! in-memory fakes.
//!
//! Execution is strictly sequential: every capability call blocks, order
//! follows the declaration order of commands, windows, and panes, and the
//! first failure aborts the remaining steps. Nothing is rolled back on
//! failure; a partially constructed session is left as a recovery starting
//! point for the user.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::{EVEN_HORIZONTAL, SessionConfig, SplitKind, expand_path, resolve_root};

// =============================================================================
// Capability Seams
// =============================================================================

/// Multiplexer operations the orchestrator drives.
///
/// Implemented by the tmux subprocess driver in production and by a
/// recording fake in tests. Handles are plain strings in the multiplexer's
/// own addressing scheme; windows are addressed as `handle + name`.
pub trait SessionDriver {
    fn session_exists(&self, name: &str) -> bool;

    /// Create a detached session seeded with `window_name` as its first
    /// window, returning the handle windows are addressed through.
    fn new_session(&self, name: &str, root: &Path, window_name: &str) -> Result<String>;

    fn new_window(&self, session: &str, name: &str, root: &Path) -> Result<String>;

    /// Type a command into a window, followed by Enter.
    fn send_keys(&self, window: &str, command: &str) -> Result<()>;

    /// Split a new pane off `window` and run `commands` inside it.
    fn split_window(
        &self,
        window: &str,
        split: SplitKind,
        root: &Path,
        commands: &[String],
    ) -> Result<String>;

    fn select_layout(&self, window: &str, layout: &str) -> Result<()>;

    fn kill_window(&self, window: &str) -> Result<()>;

    fn stop_session(&self, name: &str) -> Result<()>;

    /// Attach the calling terminal to a session; blocks until detach.
    fn attach(&self, name: &str) -> Result<()>;

    /// Redirect the already-attached outer client to another session.
    fn switch_client(&self, name: &str) -> Result<()>;
}

/// Runs one shell command in a working directory, returning its output.
pub trait CommandRunner {
    fn run(&self, command: &str, dir: &Path) -> Result<String>;
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Brings the live multiplexer state into the shape a [`SessionConfig`]
/// declares, and tears it down again.
pub struct Orchestrator<'a> {
    driver: &'a dyn SessionDriver,
    runner: &'a dyn CommandRunner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(driver: &'a dyn SessionDriver, runner: &'a dyn CommandRunner) -> Self {
        Self { driver, runner }
    }

    /// Start a session, restricted to `targets` when non-empty.
    ///
    /// 1. Resolve the session root and check session existence.
    /// 2. Fresh session: run `before_start` in the session root, then
    ///    create the session seeded with the default window name (first
    ///    target, else first configured window, else empty).
    /// 3. Existing session with no targets: nothing to build, go straight
    ///    to the attach/switch decision.
    /// 4. Walk configured windows in order, skipping manual windows on a
    ///    full start and unlisted windows on a targeted one. Create the
    ///    window where needed, type its commands, split its panes (each
    ///    root resolved against the window root), then select its layout.
    /// 5. After a full start, run the attach/switch decision.
    ///
    /// `inside_client` says whether the caller's terminal is already a
    /// multiplexer client; the caller derives it from its own environment.
    pub fn start(
        &self,
        config: &SessionConfig,
        targets: &[String],
        attach: bool,
        inside_client: bool,
    ) -> Result<()> {
        let session_root = PathBuf::from(expand_path(&config.root));

        let exists = self.driver.session_exists(&config.session);
        let handle = if exists {
            // A running session is addressable without any further query.
            if targets.is_empty() {
                return self.switch_or_attach(&config.session, attach, inside_client);
            }
            format!("{}:", config.session)
        } else {
            self.run_commands(&config.before_start, &session_root)?;

            let default_window = targets
                .first()
                .map(String::as_str)
                .or_else(|| config.windows.first().map(|w| w.name.as_str()))
                .unwrap_or_default();

            self.driver
                .new_session(&config.session, &session_root, default_window)?
        };

        for (index, window) in config.windows.iter().enumerate() {
            let skip = if targets.is_empty() {
                window.manual
            } else {
                !targets.iter().any(|t| t == &window.name)
            };
            if skip {
                continue;
            }

            let window_root = resolve_root(&window.root, &session_root);
            let target = format!("{}{}", handle, window.name);

            // Window 0 is pre-created by the session-creation call when
            // starting fresh with no explicit targets; every other case
            // needs its own window-creation call.
            let needs_window = (!exists && index > 0 && targets.is_empty())
                || (exists && !targets.is_empty());
            if needs_window {
                self.driver.new_window(&handle, &window.name, &window_root)?;
            }

            for command in &window.commands {
                self.driver.send_keys(&target, command)?;
            }

            for pane in &window.panes {
                let pane_root = resolve_root(&pane.root, &window_root);
                self.driver
                    .split_window(&target, pane.split, &pane_root, &pane.commands)?;
            }

            let layout = window.layout.as_deref().unwrap_or(EVEN_HORIZONTAL);
            self.driver.select_layout(&target, layout)?;
        }

        if targets.is_empty() {
            self.switch_or_attach(&config.session, attach, inside_client)?;
        }

        Ok(())
    }

    /// Stop a session, or kill specific windows of it.
    ///
    /// With no targets the `stop` commands run in the session root before
    /// the one teardown call; a failing command leaves the session alive.
    /// With targets each named window is killed in the given order.
    pub fn stop(&self, config: &SessionConfig, targets: &[String]) -> Result<()> {
        if targets.is_empty() {
            let session_root = PathBuf::from(expand_path(&config.root));
            self.run_commands(&config.stop, &session_root)?;
            return self.driver.stop_session(&config.session);
        }

        for name in targets {
            self.driver
                .kill_window(&format!("{}:{}", config.session, name))?;
        }

        Ok(())
    }

    /// The attach/switch decision.
    ///
    /// Inside a client and attaching: switch the outer client in place.
    /// Outside a client: attach, blocking until the user detaches. Inside
    /// a client without attaching: leave the caller exactly where they are.
    fn switch_or_attach(&self, session: &str, attach: bool, inside_client: bool) -> Result<()> {
        if inside_client && attach {
            self.driver.switch_client(session)
        } else if !inside_client {
            self.driver.attach(session)
        } else {
            Ok(())
        }
    }

    fn run_commands(&self, commands: &[String], dir: &Path) -> Result<()> {
        for command in commands {
            self.runner.run(command, dir)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::{PaneConfig, WindowConfig};

    /// Records every driver call as a flat string; fails calls whose
    /// rendering starts with `fail_on`.
    #[derive(Default)]
    struct FakeDriver {
        exists: bool,
        fail_on: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeDriver {
        fn running() -> Self {
            Self {
                exists: true,
                ..Default::default()
            }
        }

        fn record(&self, call: String) -> Result<()> {
            let failing = self.fail_on.is_some_and(|prefix| call.starts_with(prefix));
            self.calls.borrow_mut().push(call.clone());
            if failing {
                anyhow::bail!("{call} failed");
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl SessionDriver for FakeDriver {
        fn session_exists(&self, _name: &str) -> bool {
            self.exists
        }

        fn new_session(&self, name: &str, root: &Path, window_name: &str) -> Result<String> {
            self.record(format!(
                "new-session {} {} {}",
                name,
                root.display(),
                window_name
            ))?;
            Ok(format!("{name}:"))
        }

        fn new_window(&self, session: &str, name: &str, root: &Path) -> Result<String> {
            self.record(format!("new-window {session}{name} {}", root.display()))?;
            Ok(format!("{session}{name}"))
        }

        fn send_keys(&self, window: &str, command: &str) -> Result<()> {
            self.record(format!("send-keys {window} {command}"))
        }

        fn split_window(
            &self,
            window: &str,
            split: SplitKind,
            root: &Path,
            commands: &[String],
        ) -> Result<String> {
            self.record(format!(
                "split-window {window} {split:?} {} [{}]",
                root.display(),
                commands.join("; ")
            ))?;
            Ok("%1".to_string())
        }

        fn select_layout(&self, window: &str, layout: &str) -> Result<()> {
            self.record(format!("select-layout {window} {layout}"))
        }

        fn kill_window(&self, window: &str) -> Result<()> {
            self.record(format!("kill-window {window}"))
        }

        fn stop_session(&self, name: &str) -> Result<()> {
            self.record(format!("kill-session {name}"))
        }

        fn attach(&self, name: &str) -> Result<()> {
            self.record(format!("attach {name}"))
        }

        fn switch_client(&self, name: &str) -> Result<()> {
            self.record(format!("switch-client {name}"))
        }
    }

    /// Records every (command, dir) pair; fails commands starting with
    /// `fail_on`.
    #[derive(Default)]
    struct FakeRunner {
        fail_on: Option<&'static str>,
        runs: RefCell<Vec<(String, String)>>,
    }

    impl FakeRunner {
        fn runs(&self) -> Vec<(String, String)> {
            self.runs.borrow().clone()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, command: &str, dir: &Path) -> Result<String> {
            self.runs
                .borrow_mut()
                .push((command.to_string(), dir.display().to_string()));
            if self.fail_on.is_some_and(|prefix| command.starts_with(prefix)) {
                anyhow::bail!("{command} failed");
            }
            Ok(String::new())
        }
    }

    fn window(name: &str) -> WindowConfig {
        WindowConfig {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn blog_config() -> SessionConfig {
        SessionConfig {
            session: "blog".to_string(),
            root: "/work/blog".to_string(),
            before_start: Vec::new(),
            stop: Vec::new(),
            windows: vec![window("code"), window("logs"), window("shell")],
        }
    }

    #[test]
    fn fresh_full_start_creates_session_then_remaining_windows() {
        let driver = FakeDriver::default();
        let runner = FakeRunner::default();
        let mut config = blog_config();
        config.windows[0].commands = vec!["make dev".to_string()];

        Orchestrator::new(&driver, &runner)
            .start(&config, &[], true, false)
            .unwrap();

        // One session creation seeded with the first window, then explicit
        // creations for windows 2 and 3 only.
        assert_eq!(
            driver.calls(),
            vec![
                "new-session blog /work/blog code",
                "send-keys blog:code make dev",
                "select-layout blog:code even-horizontal",
                "new-window blog:logs /work/blog",
                "select-layout blog:logs even-horizontal",
                "new-window blog:shell /work/blog",
                "select-layout blog:shell even-horizontal",
                "attach blog",
            ]
        );
    }

    #[test]
    fn panes_are_split_in_order_before_the_layout_is_selected() {
        let driver = FakeDriver::default();
        let runner = FakeRunner::default();
        let mut config = blog_config();
        config.windows = vec![WindowConfig {
            name: "logs".to_string(),
            root: "log".to_string(),
            layout: Some("main-vertical".to_string()),
            panes: vec![
                PaneConfig {
                    split: SplitKind::Vertical,
                    root: "nginx".to_string(),
                    commands: vec!["tail -f error.log".to_string()],
                },
                PaneConfig {
                    root: "/var/log".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }];

        Orchestrator::new(&driver, &runner)
            .start(&config, &[], true, false)
            .unwrap();

        assert_eq!(
            driver.calls(),
            vec![
                "new-session blog /work/blog logs",
                "split-window blog:logs Vertical /work/blog/log/nginx [tail -f error.log]",
                "split-window blog:logs Horizontal /var/log []",
                "select-layout blog:logs main-vertical",
                "attach blog",
            ]
        );
    }

    #[test]
    fn fresh_start_with_no_windows_seeds_an_empty_default_name() {
        let driver = FakeDriver::default();
        let runner = FakeRunner::default();
        let mut config = blog_config();
        config.windows.clear();

        Orchestrator::new(&driver, &runner)
            .start(&config, &[], true, false)
            .unwrap();

        assert_eq!(driver.calls(), vec!["new-session blog /work/blog ", "attach blog"]);
    }

    #[test]
    fn fresh_targeted_start_seeds_the_first_target() {
        let driver = FakeDriver::default();
        let runner = FakeRunner::default();
        let config = blog_config();

        Orchestrator::new(&driver, &runner)
            .start(&config, &["logs".to_string()], true, false)
            .unwrap();

        // The creation call already produced the targeted window, so no
        // new-window follows and no attach runs for a targeted start.
        assert_eq!(
            driver.calls(),
            vec![
                "new-session blog /work/blog logs",
                "select-layout blog:logs even-horizontal",
            ]
        );
    }

    #[test]
    fn existing_session_with_no_targets_only_attaches() {
        let driver = FakeDriver::running();
        let runner = FakeRunner::default();

        Orchestrator::new(&driver, &runner)
            .start(&blog_config(), &[], true, false)
            .unwrap();

        assert_eq!(driver.calls(), vec!["attach blog"]);
    }

    #[test]
    fn existing_session_inside_client_switches_instead_of_attaching() {
        let driver = FakeDriver::running();
        let runner = FakeRunner::default();

        Orchestrator::new(&driver, &runner)
            .start(&blog_config(), &[], true, true)
            .unwrap();

        assert_eq!(driver.calls(), vec!["switch-client blog"]);
    }

    #[test]
    fn an_attach_failure_propagates_to_the_caller() {
        let driver = FakeDriver {
            exists: true,
            fail_on: Some("attach"),
            ..Default::default()
        };
        let runner = FakeRunner::default();

        let err = Orchestrator::new(&driver, &runner)
            .start(&blog_config(), &[], true, false)
            .unwrap_err();

        assert!(err.to_string().contains("attach blog"));
    }

    #[test]
    fn a_switch_failure_propagates_to_the_caller() {
        let driver = FakeDriver {
            exists: true,
            fail_on: Some("switch-client"),
            ..Default::default()
        };
        let runner = FakeRunner::default();

        let err = Orchestrator::new(&driver, &runner)
            .start(&blog_config(), &[], true, true)
            .unwrap_err();

        assert!(err.to_string().contains("switch-client blog"));
    }

    #[test]
    fn inside_client_without_attach_touches_nothing() {
        let driver = FakeDriver::running();
        let runner = FakeRunner::default();

        Orchestrator::new(&driver, &runner)
            .start(&blog_config(), &[], false, true)
            .unwrap();

        assert!(driver.calls().is_empty());
    }

    #[test]
    fn targeting_an_existing_session_creates_each_named_window() {
        let driver = FakeDriver::running();
        let runner = FakeRunner::default();

        Orchestrator::new(&driver, &runner)
            .start(
                &blog_config(),
                &["logs".to_string(), "shell".to_string()],
                true,
                false,
            )
            .unwrap();

        assert_eq!(
            driver.calls(),
            vec![
                "new-window blog:logs /work/blog",
                "select-layout blog:logs even-horizontal",
                "new-window blog:shell /work/blog",
                "select-layout blog:shell even-horizontal",
            ]
        );
    }

    #[test]
    fn unknown_target_names_are_silently_ignored() {
        let driver = FakeDriver::running();
        let runner = FakeRunner::default();

        Orchestrator::new(&driver, &runner)
            .start(&blog_config(), &["nope".to_string()], true, false)
            .unwrap();

        assert!(driver.calls().is_empty());
    }

    #[test]
    fn manual_windows_are_skipped_unless_named() {
        let mut config = blog_config();
        config.windows = vec![
            window("main"),
            WindowConfig {
                name: "scratch".to_string(),
                manual: true,
                ..Default::default()
            },
        ];

        let driver = FakeDriver::default();
        let runner = FakeRunner::default();
        Orchestrator::new(&driver, &runner)
            .start(&config, &[], true, false)
            .unwrap();
        assert!(driver.calls().iter().all(|c| !c.contains("scratch")));

        let driver = FakeDriver::running();
        Orchestrator::new(&driver, &runner)
            .start(&config, &["scratch".to_string()], true, false)
            .unwrap();
        assert_eq!(
            driver.calls(),
            vec![
                "new-window blog:scratch /work/blog",
                "select-layout blog:scratch even-horizontal",
            ]
        );
    }

    #[test]
    fn before_start_runs_in_the_session_root_before_creation() {
        let driver = FakeDriver::default();
        let runner = FakeRunner::default();
        let mut config = blog_config();
        config.before_start = vec!["mkdir -p tmp".to_string(), "make setup".to_string()];

        Orchestrator::new(&driver, &runner)
            .start(&config, &[], false, true)
            .unwrap();

        assert_eq!(
            runner.runs(),
            vec![
                ("mkdir -p tmp".to_string(), "/work/blog".to_string()),
                ("make setup".to_string(), "/work/blog".to_string()),
            ]
        );
    }

    #[test]
    fn a_failing_before_start_command_prevents_session_creation() {
        let driver = FakeDriver::default();
        let runner = FakeRunner {
            fail_on: Some("make setup"),
            ..Default::default()
        };
        let mut config = blog_config();
        config.before_start = vec!["make setup".to_string(), "make seed".to_string()];

        let err = Orchestrator::new(&driver, &runner)
            .start(&config, &[], true, false)
            .unwrap_err();

        assert!(err.to_string().contains("make setup"));
        assert!(driver.calls().is_empty());
        assert_eq!(runner.runs().len(), 1);
    }

    #[test]
    fn a_driver_failure_aborts_the_remaining_windows() {
        let driver = FakeDriver {
            fail_on: Some("new-window blog:logs"),
            ..Default::default()
        };
        let runner = FakeRunner::default();

        Orchestrator::new(&driver, &runner)
            .start(&blog_config(), &[], true, false)
            .unwrap_err();

        assert_eq!(
            driver.calls(),
            vec![
                "new-session blog /work/blog code",
                "select-layout blog:code even-horizontal",
                "new-window blog:logs /work/blog",
            ]
        );
    }

    #[test]
    fn starting_twice_never_creates_anything_the_second_time() {
        let config = blog_config();
        let runner = FakeRunner::default();

        let first = FakeDriver::default();
        Orchestrator::new(&first, &runner)
            .start(&config, &[], true, false)
            .unwrap();
        assert!(first.calls().iter().any(|c| c.starts_with("new-session")));

        let second = FakeDriver::running();
        Orchestrator::new(&second, &runner)
            .start(&config, &[], true, false)
            .unwrap();
        assert_eq!(second.calls(), vec!["attach blog"]);
    }

    #[test]
    fn stop_runs_teardown_commands_before_the_single_kill() {
        let driver = FakeDriver::running();
        let runner = FakeRunner::default();
        let mut config = blog_config();
        config.root = "~/work/blog".to_string();
        config.stop = vec!["docker compose down".to_string()];

        Orchestrator::new(&driver, &runner)
            .stop(&config, &[])
            .unwrap();

        let home = dirs::home_dir().expect("home dir available in tests");
        assert_eq!(
            runner.runs(),
            vec![(
                "docker compose down".to_string(),
                home.join("work/blog").display().to_string()
            )]
        );
        assert_eq!(driver.calls(), vec!["kill-session blog"]);
    }

    #[test]
    fn a_failing_stop_command_leaves_the_session_alive() {
        let driver = FakeDriver::running();
        let runner = FakeRunner {
            fail_on: Some("docker"),
            ..Default::default()
        };
        let mut config = blog_config();
        config.stop = vec!["docker compose down".to_string()];

        Orchestrator::new(&driver, &runner)
            .stop(&config, &[])
            .unwrap_err();

        assert!(driver.calls().is_empty());
    }

    #[test]
    fn targeted_stop_kills_windows_in_order_and_aborts_on_failure() {
        let driver = FakeDriver {
            exists: true,
            fail_on: Some("kill-window blog:logs"),
            ..Default::default()
        };
        let runner = FakeRunner::default();
        let targets = vec![
            "code".to_string(),
            "logs".to_string(),
            "shell".to_string(),
        ];

        Orchestrator::new(&driver, &runner)
            .stop(&blog_config(), &targets)
            .unwrap_err();

        assert_eq!(
            driver.calls(),
            vec!["kill-window blog:code", "kill-window blog:logs"]
        );
        assert!(runner.runs().is_empty());
    }
}
