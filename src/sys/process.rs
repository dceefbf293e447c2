//! A windowing host that opens each window by launching a browser command.
//!
//! The child's process id doubles as the window id. Only processes this host
//! spawned itself are ever signalled: ids recorded by an earlier run may
//! belong to an unrelated process by now.

use std::process::{Child, Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, trace};

use crate::common::collections::HashMap;
use crate::common::config::HostSettings;
use crate::sys::geometry::Rect;
use crate::sys::window_server::{HostError, WindowHost, WindowServerId, WindowSpec};

/// Splits a command line into arguments, honouring single and double quotes
/// and backslash escapes inside quotes.
pub fn parse_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current_part = String::new();
    // The quote character that opened the current quoted span.
    let mut quote: Option<char> = None;
    let mut chars = command.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' if quote.is_none() => quote = Some(ch),
            _ if quote == Some(ch) => quote = None,
            ' ' | '\t' if quote.is_none() => {
                if !current_part.is_empty() {
                    parts.push(std::mem::take(&mut current_part));
                }
            }
            '\\' if quote.is_some() => match chars.next() {
                Some('n') => current_part.push('\n'),
                Some('t') => current_part.push('\t'),
                Some(next @ ('\\' | '\'' | '"')) => current_part.push(next),
                Some(next) => {
                    current_part.push('\\');
                    current_part.push(next);
                }
                None => current_part.push('\\'),
            },
            _ => current_part.push(ch),
        }
    }

    if !current_part.is_empty() {
        parts.push(current_part);
    }

    parts
}

fn render(arg: &str, spec: &WindowSpec) -> String {
    arg.replace("{url}", &spec.url)
        .replace("{left}", &spec.frame.left.to_string())
        .replace("{top}", &spec.frame.top.to_string())
        .replace("{width}", &spec.frame.width.to_string())
        .replace("{height}", &spec.frame.height.to_string())
}

pub struct CommandHost {
    frame: Option<Rect>,
    argv: Vec<String>,
    children: HashMap<WindowServerId, Child>,
    /// Signalled but not yet reaped.
    exiting: Vec<Child>,
}

impl CommandHost {
    pub fn new(frame: Option<Rect>, launch_command: &str) -> Self {
        Self {
            frame,
            argv: parse_command(launch_command),
            children: HashMap::default(),
            exiting: Vec::new(),
        }
    }

    pub fn from_settings(settings: &HostSettings) -> Self {
        Self::new(settings.frame, &settings.launch_command)
    }

    fn command_for(&self, spec: &WindowSpec) -> Result<Command, HostError> {
        let (program, args) = self.argv.split_first().ok_or(HostError::EmptyCommand)?;
        let mut command = Command::new(program);
        command
            .args(args.iter().map(|arg| render(arg, spec)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(command)
    }

    /// Collects children that have exited so they do not linger as zombies.
    fn reap(&mut self) {
        self.children.retain(|id, child| match child.try_wait() {
            Ok(Some(status)) => {
                trace!(%id, ?status, "window process exited");
                false
            }
            Ok(None) => true,
            Err(_) => false,
        });
        self.exiting.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl WindowHost for CommandHost {
    fn current_frame(&mut self) -> Option<Rect> { self.frame }

    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowServerId, HostError> {
        self.reap();
        let child = self.command_for(spec)?.spawn()?;
        let id = WindowServerId::new(child.id());
        debug!(%id, url = %spec.url, frame = %spec.frame, focused = spec.focused, "launched window");
        self.children.insert(id, child);
        Ok(id)
    }

    fn remove_window(&mut self, id: WindowServerId) -> Result<(), HostError> {
        self.reap();
        let Some(child) = self.children.remove(&id) else {
            return Err(HostError::NoSuchWindow(id));
        };
        let pid = i32::try_from(child.id()).map_err(|_| HostError::NoSuchWindow(id))?;
        // The child is unreaped, so its pid cannot have been reused yet.
        let result = match signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(HostError::NoSuchWindow(id)),
            Err(source) => Err(HostError::Remove { id, source }),
        };
        self.exiting.push(child);
        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn spec(url: &str) -> WindowSpec {
        WindowSpec {
            url: url.to_string(),
            frame: Rect::new(10, 20, 640, 480),
            focused: true,
        }
    }

    #[test]
    fn parses_quoted_arguments() {
        assert_eq!(
            parse_command(r#"chromium --new-window "--class=Mail Client" {url}"#),
            vec!["chromium", "--new-window", "--class=Mail Client", "{url}"]
        );
        assert_eq!(parse_command("  a\t b  "), vec!["a", "b"]);
        assert_eq!(parse_command(r#"echo "a\"b\n""#), vec!["echo", "a\"b\n"]);
        assert!(parse_command("   ").is_empty());
    }

    #[test]
    fn other_quote_character_is_literal_inside_quotes() {
        assert_eq!(
            parse_command(r#"open "it's mail" 'say "hi"'"#),
            vec!["open", "it's mail", "say \"hi\""]
        );
    }

    #[test]
    fn placeholders_are_substituted_per_argument() {
        let host = CommandHost::new(
            None,
            "browser --window-position={left},{top} --window-size={width},{height} {url}",
        );
        let command = host.command_for(&spec("https://a.com/?q=x y")).unwrap();
        let args: Vec<String> =
            command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(command.get_program(), "browser");
        assert_eq!(
            args,
            vec![
                "--window-position=10,20",
                "--window-size=640,480",
                "https://a.com/?q=x y"
            ]
        );
    }

    #[test]
    fn reports_configured_frame() {
        let frame = Rect::new(0, 0, 1440, 900);
        assert_eq!(CommandHost::new(Some(frame), "x {url}").current_frame(), Some(frame));
        assert_eq!(CommandHost::new(None, "x {url}").current_frame(), None);
    }

    #[test]
    fn empty_command_cannot_create_windows() {
        let mut host = CommandHost::new(None, "");
        assert!(matches!(host.create_window(&spec("https://a.com")), Err(HostError::EmptyCommand)));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut host = CommandHost::new(None, "/nonexistent/wingroups-browser {url}");
        assert!(matches!(host.create_window(&spec("https://a.com")), Err(HostError::Spawn(_))));
    }

    #[test]
    fn launched_windows_can_be_removed() {
        let mut host = CommandHost::new(None, "sh -c 'sleep 30' {url}");
        let id = host.create_window(&spec("https://a.com")).unwrap();
        assert!(id.as_u32() > 0);
        host.remove_window(id).unwrap();
    }

    #[test]
    fn removing_unknown_windows_fails() {
        let mut host = CommandHost::new(None, "x {url}");
        for raw in [0, i32::MAX as u32, u32::MAX] {
            let id = WindowServerId::new(raw);
            assert!(matches!(host.remove_window(id), Err(HostError::NoSuchWindow(_))));
        }
    }

    #[test]
    fn processes_it_did_not_launch_are_left_alone() {
        let mut other = Command::new("sleep").arg("30").spawn().unwrap();
        let mut host = CommandHost::new(None, "x {url}");

        let id = WindowServerId::new(other.id());
        assert!(matches!(host.remove_window(id), Err(HostError::NoSuchWindow(_))));
        assert!(other.try_wait().unwrap().is_none());

        other.kill().unwrap();
        other.wait().unwrap();
    }

    #[test]
    fn removed_windows_are_forgotten() {
        let mut host = CommandHost::new(None, "sh -c 'sleep 30' {url}");
        let id = host.create_window(&spec("https://a.com")).unwrap();
        host.remove_window(id).unwrap();
        assert!(matches!(host.remove_window(id), Err(HostError::NoSuchWindow(_))));
    }
}
