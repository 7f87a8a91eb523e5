use crate::prompt::Prompt;
use engine::{Engine, EngineKind, Settings};
use error::HospitalError;
use tokio::io::AsyncBufRead;
use tracing::error;

mod cassandra;
mod graph;
mod mongo;

/// Number of reads used when the typed count is not a number.
pub const DEFAULT_READS: i32 = 10;

const RULE: &str = "============================================================";

/// What a sub-menu does after handling one option.
pub(crate) enum Step {
    Continue,
    Exit,
}

pub fn parse_option(input: &str) -> Option<u32> {
    input.trim().parse().ok()
}

/// Splits a comma-separated id list, dropping blank entries.
pub fn parse_ids(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_count(input: &str) -> i32 {
    input.trim().parse().unwrap_or(DEFAULT_READS)
}

fn print_main_menu() {
    println!("HOSPITAL SYSTEM - DATABASES");
    println!("{}", RULE);
    println!("1. Cassandra");
    println!("2. MongoDB");
    println!("3. Graph");
    println!("0. Exit");
}

/// Top level loop; returns when the user exits or the input ends.
pub async fn run<R>(prompt: &mut Prompt<R>, settings: &Settings) -> Result<(), HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print_main_menu();
        let Some(choice) = prompt.ask("Select an option: ").await? else {
            return Ok(());
        };

        let kind = match parse_option(&choice) {
            Some(1) => EngineKind::Cassandra,
            Some(2) => EngineKind::MongoDB,
            Some(3) => EngineKind::Neo4j,
            Some(0) => {
                println!("Thanks for using the system!");
                return Ok(());
            }
            _ => {
                println!("Invalid option");
                continue;
            }
        };

        if let Err(err) = session(kind, prompt, settings).await {
            if matches!(err, HospitalError::WrappedError(_)) {
                return Err(err);
            }
            error!("{} session failed: {}", kind, err);
            println!("Could not use {}: {}", kind, err);
        }
    }
}

/// Opens one connection for the whole sub-menu and releases it on the way out.
async fn session<R>(
    kind: EngineKind,
    prompt: &mut Prompt<R>,
    settings: &Settings,
) -> Result<(), HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    let engine = Engine::connect(kind, settings).await?;

    let res = match &engine {
        Engine::Cassandra(cassandra) => cassandra::run(cassandra, prompt).await,
        Engine::MongoDB(mongo) => mongo::run(mongo, prompt).await,
        Engine::Neo4j(neo) => graph::run(neo, prompt).await,
    };

    engine.stop().await?;
    res
}

/// Logs a failed option and keeps the sub-menu alive; console failures end it.
pub(crate) fn report(kind: EngineKind, res: Result<Step, HospitalError>) -> Result<Step, HospitalError> {
    match res {
        Ok(step) => Ok(step),
        Err(err @ HospitalError::WrappedError(_)) => Err(err),
        Err(err) => {
            error!("{} query failed: {}", kind, err);
            println!("Query failed: {}", err);
            Ok(Step::Continue)
        }
    }
}

pub(crate) fn print_rows<T: std::fmt::Display>(rows: &[T]) {
    for row in rows {
        println!("{}", row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option() {
        assert_eq!(parse_option(" 7 "), Some(7));
        assert_eq!(parse_option("0"), Some(0));
        assert_eq!(parse_option("seven"), None);
        assert_eq!(parse_option("-1"), None);
        assert_eq!(parse_option(""), None);
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(
            parse_ids("P001, P002 ,,P003 "),
            vec!["P001".to_string(), "P002".to_string(), "P003".to_string()]
        );
        assert!(parse_ids(" , ").is_empty());
        assert!(parse_ids("").is_empty());
    }

    #[test]
    fn test_parse_count_falls_back() {
        assert_eq!(parse_count("3"), 3);
        assert_eq!(parse_count(" 25 "), 25);
        assert_eq!(parse_count("ten"), DEFAULT_READS);
        assert_eq!(parse_count(""), DEFAULT_READS);
        // not a fallback case, rejected by the query itself
        assert_eq!(parse_count("0"), 0);
    }

    #[test]
    fn test_report_keeps_session_on_query_errors() {
        let res = report(
            EngineKind::Cassandra,
            Err(HospitalError::invalid_input("bad date")),
        );
        assert!(matches!(res, Ok(Step::Continue)));

        let res = report(
            EngineKind::Cassandra,
            Err(HospitalError::from(std::io::Error::other("stdout closed"))),
        );
        assert!(matches!(res, Err(HospitalError::WrappedError(_))));
    }

    #[tokio::test]
    async fn test_main_menu_without_connecting() {
        let settings = Settings::load(Some(Default::default())).unwrap();
        let mut prompt = Prompt::new(&b"9\nabc\n0\n"[..]);

        run(&mut prompt, &settings).await.unwrap();
    }

    #[tokio::test]
    async fn test_main_menu_ends_with_input() {
        let settings = Settings::load(Some(Default::default())).unwrap();
        let mut prompt = Prompt::new(&b""[..]);

        run(&mut prompt, &settings).await.unwrap();
    }
}
