//! Line-oriented command scripts for `hostgrid run`.

use std::time::Duration;

use anyhow::{bail, Context};

use hostgrid_state::parse_replica_count;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Start(String),
    Stop(String),
    Restart(String),
    Delete(String),
    StartService { deployment: String, service: String },
    StopService { deployment: String, service: String },
    Scale { deployment: String, service: String, replicas: u32 },
    Wait(Duration),
    Show(Option<String>),
    Totals,
    Quit,
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ScriptCommand>> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    let owned = |i: usize| words[i].to_string();

    let command = match (words[0], words.len()) {
        ("start", 2) => ScriptCommand::Start(owned(1)),
        ("stop", 2) => ScriptCommand::Stop(owned(1)),
        ("restart", 2) => ScriptCommand::Restart(owned(1)),
        ("delete", 2) => ScriptCommand::Delete(owned(1)),
        ("start-service", 3) => ScriptCommand::StartService {
            deployment: owned(1),
            service: owned(2),
        },
        ("stop-service", 3) => ScriptCommand::StopService {
            deployment: owned(1),
            service: owned(2),
        },
        ("scale", 4) => ScriptCommand::Scale {
            deployment: owned(1),
            service: owned(2),
            replicas: parse_replica_count(words[3])?,
        },
        ("wait", 2) => {
            let ms: u64 = words[1]
                .parse()
                .with_context(|| format!("wait expects milliseconds, got {:?}", words[1]))?;
            ScriptCommand::Wait(Duration::from_millis(ms))
        }
        ("show", 1) => ScriptCommand::Show(None),
        ("show", 2) => ScriptCommand::Show(Some(owned(1))),
        ("totals", 1) => ScriptCommand::Totals,
        ("quit" | "exit", 1) => ScriptCommand::Quit,
        (
            "start" | "stop" | "restart" | "delete" | "start-service" | "stop-service" | "scale"
            | "wait" | "show" | "totals" | "quit" | "exit",
            n,
        ) => bail!("wrong number of arguments for {:?}: {}", words[0], n - 1),
        (other, _) => bail!("unknown command {other:?}"),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostgrid_state::{ErrorKind, StateError};

    #[test]
    fn parses_every_command() {
        let cases = [
            ("start d1", ScriptCommand::Start("d1".into())),
            ("stop d1", ScriptCommand::Stop("d1".into())),
            ("restart d1", ScriptCommand::Restart("d1".into())),
            ("delete d1", ScriptCommand::Delete("d1".into())),
            (
                "start-service d1 web",
                ScriptCommand::StartService {
                    deployment: "d1".into(),
                    service: "web".into(),
                },
            ),
            (
                "stop-service d1 web",
                ScriptCommand::StopService {
                    deployment: "d1".into(),
                    service: "web".into(),
                },
            ),
            (
                "scale d1 web 4",
                ScriptCommand::Scale {
                    deployment: "d1".into(),
                    service: "web".into(),
                    replicas: 4,
                },
            ),
            ("wait 2500", ScriptCommand::Wait(Duration::from_millis(2500))),
            ("show", ScriptCommand::Show(None)),
            ("show d1", ScriptCommand::Show(Some("d1".into()))),
            ("totals", ScriptCommand::Totals),
            ("quit", ScriptCommand::Quit),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_line(line).unwrap(), Some(expected), "line {line:?}");
        }
    }

    #[test]
    fn skips_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   # just a note").unwrap(), None);
        assert_eq!(
            parse_line("start d1  # boot it").unwrap(),
            Some(ScriptCommand::Start("d1".into()))
        );
    }

    #[test]
    fn rejects_bad_arity_and_unknown() {
        assert!(parse_line("start").unwrap_err().to_string().contains("wrong number"));
        assert!(parse_line("scale d1 web").is_err());
        assert!(parse_line("launch d1").unwrap_err().to_string().contains("unknown"));
    }

    #[test]
    fn rejects_bad_replica_counts() {
        for bad in ["-1", "2.5", "many"] {
            let err = parse_line(&format!("scale d1 web {bad}")).unwrap_err();
            let state_err = err.downcast_ref::<StateError>().expect("state error");
            assert_eq!(state_err.kind(), ErrorKind::InvalidArgument);
        }
        assert!(parse_line("wait soon").is_err());
    }
}
