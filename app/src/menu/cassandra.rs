use super::{Step, parse_count, parse_ids, parse_option, print_rows, report};
use crate::prompt::Prompt;
use engine::model::Interval;
use engine::shaper::displayed_count;
use engine::{Cassandra, EngineKind, Thresholds};
use error::HospitalError;
use tokio::io::AsyncBufRead;
use tracing::error;

const EXIT: u32 = 11;

const OPTIONS: [(u32, &str); 12] = [
    (0, "Populate sample data"),
    (1, "Show heart rate, steps and spo2 (Q1)"),
    (2, "Show heart rate and glucose by interval (Q2)"),
    (3, "Show glucose by patient (Q3)"),
    (4, "Show last read by N patients (Q4)"),
    (5, "Show last read by one patient (Q5)"),
    (6, "Show out-of-range readings for patient (Q6)"),
    (7, "Show heart_rate stats by patient (Q7)"),
    (8, "Show last N reads by patient (Q8)"),
    (9, "Show readings by patient (Q9)"),
    (10, "Show weareable info by patient (Q10)"),
    (EXIT, "Exit"),
];

fn print_menu() {
    println!("\n{}", "=".repeat(50));
    for (key, label) in OPTIONS {
        println!("{} -- {}", key, label);
    }
}

pub(crate) async fn run<R>(cassandra: &Cassandra, prompt: &mut Prompt<R>) -> Result<(), HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print_menu();
        let Some(choice) = prompt.ask("\nEnter your choice: ").await? else {
            return Ok(());
        };
        let Some(option) = parse_option(&choice) else {
            println!("Please enter a valid number.");
            continue;
        };
        if option == EXIT {
            println!("Exiting application...");
            return Ok(());
        }

        let step = handle(cassandra, prompt, option).await;
        if let Step::Exit = report(EngineKind::Cassandra, step)? {
            return Ok(());
        }
    }
}

async fn handle<R>(
    cassandra: &Cassandra,
    prompt: &mut Prompt<R>,
    option: u32,
) -> Result<Step, HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    match option {
        0 => {
            println!("Populating sample data...");
            let summary = cassandra.populate_sample_data().await?;
            println!(
                "Sample data populated successfully! ({} readings, {} wearables in {} batches)",
                summary.readings, summary.wearables, summary.batches
            );
        }
        1 => {
            let Some(id) = prompt.ask("Enter patient ID: ").await? else {
                return Ok(Step::Exit);
            };
            println!("\nQ1: Show heart rate, steps and spo2 for patient {}", id);
            print_rows(&cassandra.data_by_patient(&id).await?);
        }
        2 => {
            let Some(id) = prompt.ask("Enter patient ID: ").await? else {
                return Ok(Step::Exit);
            };
            let Some(start) = prompt
                .ask("Enter start datetime (YYYY-MM-DD HH:MM:SS): ")
                .await?
            else {
                return Ok(Step::Exit);
            };
            let Some(end) = prompt
                .ask("Enter end datetime (YYYY-MM-DD HH:MM:SS): ")
                .await?
            else {
                return Ok(Step::Exit);
            };
            let interval = Interval::parse(&start, &end)?;
            print_rows(&cassandra.readings_by_interval(&id, &interval).await?);
        }
        3 => {
            let Some(id) = prompt.ask("Enter patient ID: ").await? else {
                return Ok(Step::Exit);
            };
            println!("\nQ3: Show glucose by patient: {}", id);
            print_rows(&cassandra.glucose_by_patient(&id).await?);
        }
        4 => {
            let Some(ids) = prompt.ask("Enter comma-separated patient IDs: ").await? else {
                return Ok(Step::Exit);
            };
            print_rows(&cassandra.last_read_by_patients(&parse_ids(&ids)).await?);
        }
        5 => {
            let Some(id) = prompt.ask("Enter patient ID: ").await? else {
                return Ok(Step::Exit);
            };
            match cassandra.last_read_by_patient(&id).await? {
                Some(reading) => println!("{}", reading),
                None => println!("None"),
            }
        }
        6 => {
            let Some(id) = prompt.ask("Enter patient ID: ").await? else {
                return Ok(Step::Exit);
            };
            if id.is_empty() {
                println!("Patient ID is empty.");
                return Ok(Step::Continue);
            }
            let flagged = cassandra
                .out_of_range_by_patient(&id, &Thresholds::default())
                .await?;
            if flagged.is_empty() {
                println!("No out-of-range readings for patient {}.", id);
            } else {
                println!("Out-of-range readings for patient {}:", id);
                print_rows(&flagged);
            }
        }
        7 => {
            let Some(id) = prompt.ask("Enter patient ID for heart rate stats: ").await? else {
                return Ok(Step::Exit);
            };
            if id.is_empty() {
                println!("Patient ID is empty.");
                return Ok(Step::Continue);
            }
            let stats = cassandra.heart_rate_stats(&id).await?;
            println!("Heart rate stats for {}: {}", id, stats);
        }
        8 => {
            let Some(id) = prompt.ask("Enter patient ID: ").await? else {
                return Ok(Step::Exit);
            };
            let Some(n) = prompt.ask("Enter N (number of reads): ").await? else {
                return Ok(Step::Exit);
            };
            print_rows(&cassandra.last_reads_by_patient(&id, parse_count(&n)).await?);
        }
        9 => {
            let Some(id) = prompt.ask("Enter patient ID to count reads: ").await? else {
                return Ok(Step::Exit);
            };
            if id.is_empty() {
                println!("Patient ID is empty.");
                return Ok(Step::Continue);
            }
            let count = cassandra.readings_count(&id).await;
            if let Err(err) = &count {
                error!("counting readings of {} failed: {}", id, err);
            }
            println!("Patient {} has {} readings.", id, displayed_count(&count));
        }
        10 => {
            let Some(id) = prompt.ask("Enter patient ID to look up wearable info: ").await?
            else {
                return Ok(Step::Exit);
            };
            print_rows(&cassandra.wearable_by_patient(&id).await?);
        }
        _ => println!("Invalid option. Please try again."),
    }
    Ok(Step::Continue)
}
