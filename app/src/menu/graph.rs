use super::{Step, parse_option, report};
use crate::prompt::Prompt;
use engine::{EngineKind, GraphQuery, Neo4j};
use error::HospitalError;
use tokio::io::AsyncBufRead;

const EXIT: u32 = 11;
const DEFAULT_SPECIALISTS: i64 = 3;

fn print_menu() {
    println!("\n=== Hospital - Graph module ===");
    for (index, query) in GraphQuery::ALL.iter().enumerate() {
        println!("{}. Query: {}", index + 1, query.title());
    }
    println!("{}. Exit", EXIT);
}

/// Menu option `1..=10` to its query.
pub fn query_for(option: u32) -> Option<GraphQuery> {
    let index = usize::try_from(option).ok()?.checked_sub(1)?;
    GraphQuery::ALL.get(index).copied()
}

fn question(query: GraphQuery) -> &'static str {
    match query.parameter() {
        "patient_id" => "Patient ID: ",
        "doctor_id" => "Doctor ID: ",
        "medicine_id" => "Medicine ID: ",
        "diagnosis_id" => "Diagnosis ID: ",
        _ => "Specialty: ",
    }
}

pub(crate) async fn run<R>(neo: &Neo4j, prompt: &mut Prompt<R>) -> Result<(), HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print_menu();
        let Some(choice) = prompt.ask("> ").await? else {
            return Ok(());
        };
        let option = parse_option(&choice);
        if option == Some(EXIT) {
            return Ok(());
        }
        let Some(query) = option.and_then(query_for) else {
            println!("Invalid option.");
            continue;
        };

        let step = handle(neo, prompt, query).await;
        if let Step::Exit = report(EngineKind::Neo4j, step)? {
            return Ok(());
        }
    }
}

async fn handle<R>(neo: &Neo4j, prompt: &mut Prompt<R>, query: GraphQuery) -> Result<Step, HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    let Some(input) = prompt.ask(question(query)).await? else {
        return Ok(Step::Exit);
    };

    let values = if query == GraphQuery::SpecialistRecommendation {
        let Some(limit) = prompt.ask("How many doctors: ").await? else {
            return Ok(Step::Exit);
        };
        let limit = limit.trim().parse().unwrap_or(DEFAULT_SPECIALISTS);
        neo.recommend_specialists(&input, limit).await?
    } else {
        neo.lookup(query, &input).await?
    };

    println!("\n{}", query.title());
    if values.is_empty() {
        println!("No results.");
    }
    for value in values {
        let pretty = serde_json::to_string_pretty(&value)
            .map_err(HospitalError::graph)?;
        println!("{}", pretty);
    }
    Ok(Step::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_for_option() {
        assert_eq!(query_for(1), Some(GraphQuery::PrimaryCare));
        assert_eq!(query_for(8), Some(GraphQuery::SpecialistRecommendation));
        assert_eq!(query_for(10), Some(GraphQuery::DoctorClinics));
        assert_eq!(query_for(0), None);
        assert_eq!(query_for(EXIT), None);
    }

    #[test]
    fn test_questions() {
        assert_eq!(question(GraphQuery::CareTeam), "Patient ID: ");
        assert_eq!(question(GraphQuery::TreatmentPlan), "Diagnosis ID: ");
        assert_eq!(question(GraphQuery::SpecialistRecommendation), "Specialty: ");
    }
}
