use super::{RULE, Step, parse_option, report};
use crate::prompt::Prompt;
use chrono::Local;
use engine::mongo::{age_on, field};
use engine::{EngineKind, MongoDB};
use error::HospitalError;
use mongodb::bson::{Bson, Document};
use tokio::io::AsyncBufRead;

const LOW_STOCK: i64 = 50;
const TOP_DIAGNOSES: i64 = 10;

fn print_menu() {
    println!("{}", RULE);
    println!("       HOSPITAL SYSTEM - MONGODB QUERIES");
    println!("{}", RULE);
    println!("1. List all patients");
    println!("2. Find patient by ID");
    println!("3. Patients with registered allergies");
    println!("4. Search patient by first or last name");
    println!("5. List all medicines");
    println!("6. Medicines with low stock");
    println!("7. Search medicine by active ingredient");
    println!("8. Show clinical record by patient ID");
    println!("9. Most frequent diagnoses");
    println!("10. Patients taking a given medicine");
    println!("0. Exit");
    println!("{}", RULE);
}

fn age(document: &Document) -> String {
    age_on(
        &field(document, "Fecha_de_Nacimiento"),
        Local::now().date_naive(),
    )
    .map(|age| age.to_string())
    .unwrap_or_else(|| "N/A".to_string())
}

fn documents(key: &str, document: &Document) -> Vec<Document> {
    match document.get(key) {
        Some(Bson::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_document().cloned())
            .collect(),
        _ => vec![],
    }
}

fn print_patient_line(p: &Document) {
    println!(
        "ID: {:<6} | {} {:<25} | Tel: {}",
        field(p, "Paciente_ID"),
        field(p, "Nombre"),
        field(p, "Apellido"),
        field(p, "Telefono")
    );
}

pub(crate) async fn run<R>(mongo: &MongoDB, prompt: &mut Prompt<R>) -> Result<(), HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print_menu();
        let Some(choice) = prompt.ask("Select an option: ").await? else {
            return Ok(());
        };
        match parse_option(&choice) {
            Some(0) => {
                println!("Leaving the system. Goodbye.");
                return Ok(());
            }
            Some(option) => {
                let step = handle(mongo, prompt, option).await;
                if let Step::Exit = report(EngineKind::MongoDB, step)? {
                    return Ok(());
                }
            }
            None => println!("Invalid option."),
        }
    }
}

async fn handle<R>(mongo: &MongoDB, prompt: &mut Prompt<R>, option: u32) -> Result<Step, HospitalError>
where
    R: AsyncBufRead + Unpin,
{
    match option {
        1 => {
            println!("\nPATIENTS");
            println!("{}", "-".repeat(80));
            for p in mongo.all_patients().await? {
                println!(
                    "ID: {:<6} | {} {:<25} | Age: {:<3} | Tel: {}",
                    field(&p, "Paciente_ID"),
                    field(&p, "Nombre"),
                    field(&p, "Apellido"),
                    age(&p),
                    field(&p, "Telefono")
                );
            }
            println!("{}", "-".repeat(80));
        }
        2 => {
            let Some(id) = prompt.ask("Patient ID (e.g. P001): ").await? else {
                return Ok(Step::Exit);
            };
            match mongo.patient_by_id(&id).await? {
                None => println!("Patient not found."),
                Some(p) => {
                    let allergies = field(&p, "Alergias");
                    println!("\nPATIENT DETAIL");
                    println!("{}", "-".repeat(60));
                    println!("ID            : {}", field(&p, "Paciente_ID"));
                    println!("Name          : {} {}", field(&p, "Nombre"), field(&p, "Apellido"));
                    println!("Age           : {} years", age(&p));
                    println!("Phone         : {}", field(&p, "Telefono"));
                    println!("City          : {}", field(&p, "Domicilio_Ciudad"));
                    println!("Gender        : {}", field(&p, "Genero"));
                    println!("Occupation    : {}", field(&p, "Ocupacion"));
                    println!(
                        "Allergies     : {}",
                        if allergies.is_empty() { "None" } else { allergies.as_str() }
                    );
                    println!(
                        "Emergency     : {} ({}) - {}",
                        field(&p, "Datos_emergencia_Nombre"),
                        field(&p, "Datos_emergencia_Parentesco"),
                        field(&p, "Datos_emergencia_Celular")
                    );
                    println!("{}", "-".repeat(60));
                }
            }
        }
        3 => {
            println!("\nPATIENTS WITH REGISTERED ALLERGIES");
            for p in mongo.patients_with_allergies().await? {
                println!(
                    "ID: {:<6} | {} {:<25} | Allergies: {}",
                    field(&p, "Paciente_ID"),
                    field(&p, "Nombre"),
                    field(&p, "Apellido"),
                    field(&p, "Alergias")
                );
            }
        }
        4 => {
            let Some(text) = prompt.ask("Search by first or last name: ").await? else {
                return Ok(Step::Exit);
            };
            println!("\nRESULTS FOR: {}", text.to_uppercase());
            mongo
                .search_patients_by_name(&text)
                .await?
                .iter()
                .for_each(print_patient_line);
        }
        5 => {
            println!("\nMEDICINE INVENTORY");
            for m in mongo.all_medicines().await? {
                println!(
                    "ID: {:<3} | {:<20} | {:<25} | Dose: {:<8} | Stock: {:<4} | Expires: {}",
                    field(&m, "Medicamento_ID"),
                    field(&m, "Nombre"),
                    field(&m, "Principio_Activo"),
                    field(&m, "Dosis"),
                    field(&m, "Stock"),
                    field(&m, "Fecha_Vencimiento")
                );
            }
        }
        6 => {
            println!("\nMEDICINES WITH LOW STOCK (<= {} units)", LOW_STOCK);
            for m in mongo.medicines_low_stock(LOW_STOCK).await? {
                println!(
                    "ID: {:<3} | {:<20} | Stock: {:<4} | Manufacturer: {}",
                    field(&m, "Medicamento_ID"),
                    field(&m, "Nombre"),
                    field(&m, "Stock"),
                    field(&m, "Fabricante")
                );
            }
        }
        7 => {
            let Some(ingredient) = prompt.ask("Active ingredient: ").await? else {
                return Ok(Step::Exit);
            };
            println!("\nRESULTS FOR: {}", ingredient.to_uppercase());
            for m in mongo.medicines_by_active_ingredient(&ingredient).await? {
                println!(
                    "ID: {:<3} | {:<20} | Dose: {:<8} | Stock: {}",
                    field(&m, "Medicamento_ID"),
                    field(&m, "Nombre"),
                    field(&m, "Dosis"),
                    field(&m, "Stock")
                );
            }
        }
        8 => {
            let Some(id) = prompt.ask("Patient ID (e.g. 1): ").await? else {
                return Ok(Step::Exit);
            };
            match mongo.clinical_record_by_patient_id(&id).await? {
                None => println!("No clinical record for this patient."),
                Some(record) => {
                    println!("\nCLINICAL RECORD - Patient ID: {}", id);
                    println!("Created: {}", field(&record, "Fecha_Creacion"));
                    println!("\nAPPOINTMENTS:");
                    for c in documents("Citas", &record) {
                        println!(
                            "  {} - {} ({})",
                            field(&c, "fecha"),
                            field(&c, "motivo"),
                            field(&c, "medico")
                        );
                    }
                    println!("\nDIAGNOSES:");
                    if let Ok(diagnoses) = record.get_array("Diagnosticos") {
                        for d in diagnoses {
                            println!("  - {}", d.as_str().unwrap_or_default());
                        }
                    }
                    println!("\nTREATMENTS:");
                    for t in documents("Tratamientos", &record) {
                        println!(
                            "  - {} | {} | {}",
                            field(&t, "medicamento"),
                            field(&t, "dosis"),
                            field(&t, "frecuencia")
                        );
                    }
                }
            }
        }
        9 => {
            println!("\nMOST FREQUENT DIAGNOSES");
            for item in mongo.frequent_diagnoses(TOP_DIAGNOSES).await? {
                println!("{:<35} | {} cases", field(&item, "_id"), field(&item, "cantidad"));
            }
        }
        10 => {
            let Some(medicine) = prompt.ask("Medicine name: ").await? else {
                return Ok(Step::Exit);
            };
            println!("\nPATIENTS TAKING: {}", medicine.to_uppercase());
            for p in mongo.patients_on_treatment(&medicine).await? {
                let treatments = documents("Tratamiento", &p)
                    .iter()
                    .map(|t| field(t, "medicamento"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "ID: {:<6} | {} {:<25} | Treatment: {}",
                    field(&p, "Paciente_ID"),
                    field(&p, "Nombre"),
                    field(&p, "Apellido"),
                    treatments
                );
            }
        }
        _ => println!("Invalid option."),
    }
    Ok(Step::Continue)
}
