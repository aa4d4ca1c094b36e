use clap::{Args, Parser, Subcommand};
use medico_core::{
    case_data_dir_from_env_value, hospitals_file_from_env_value, rate_multiplier_from_env_value,
    storage::read_yaml, CaseFilter, CaseId, CaseService, CaseStatus, CaseView, CoreConfig,
    FileCaseStore, HospitalId, HospitalRegistry, HospitalSeed, ProcedureLedger,
    StaticUserDirectory, UserId,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medico")]
#[command(about = "Medico surgical case and billing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the hospital registry
    #[command(subcommand)]
    Hospitals(HospitalCommands),
    /// Inspect surgical cases
    #[command(subcommand)]
    Cases(CaseCommands),
    /// Price an RVU without storing anything
    Quote {
        /// Relative value units
        #[arg(long)]
        rvu: Decimal,
        /// Hospital whose multiplier applies
        #[arg(long, conflicts_with = "factor")]
        hospital: Option<HospitalId>,
        /// Explicit multiplier
        #[arg(long)]
        factor: Option<Decimal>,
    },
}

#[derive(Subcommand)]
enum HospitalCommands {
    /// List hospitals ordered by name
    List,
    /// Register hospitals from a YAML list of `name`, `location`, `rate_multiplier`
    Seed {
        /// Path to the YAML file
        file: PathBuf,
    },
    /// Change a hospital's rate multiplier
    SetRate {
        /// Hospital UUID
        hospital: HospitalId,
        /// New multiplier (must be greater than zero)
        rate: Decimal,
    },
}

#[derive(Args)]
struct UserArg {
    /// Physician UUID the command acts for
    #[arg(long)]
    user: UserId,
}

#[derive(Subcommand)]
enum CaseCommands {
    /// List own and assisted cases, most recent first
    List {
        #[command(flatten)]
        user: UserArg,
        /// Only cases with this status
        #[arg(long)]
        status: Option<String>,
        /// Only cases the user assists
        #[arg(long)]
        assisted: bool,
        /// Match on patient name or id
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one case with its procedures
    Show {
        /// Case UUID
        id: CaseId,
        #[command(flatten)]
        user: UserArg,
    },
    /// Statistics over the user's own cases
    Stats {
        #[command(flatten)]
        user: UserArg,
    },
}

fn core_config() -> Result<Arc<CoreConfig>, Box<dyn std::error::Error>> {
    let case_data_dir = case_data_dir_from_env_value(std::env::var("MEDICO_DATA_DIR").ok());
    let hospitals_file =
        hospitals_file_from_env_value(std::env::var("MEDICO_HOSPITALS_FILE").ok(), &case_data_dir);
    let default_rate = rate_multiplier_from_env_value(std::env::var("MEDICO_DEFAULT_RATE").ok())?;
    Ok(Arc::new(CoreConfig::new(
        case_data_dir,
        hospitals_file,
        default_rate,
    )?))
}

fn case_service(
    cfg: Arc<CoreConfig>,
) -> Result<CaseService<FileCaseStore>, Box<dyn std::error::Error>> {
    let hospitals = Arc::new(HospitalRegistry::open(cfg.hospitals_file())?);
    let store = FileCaseStore::new(cfg.clone());
    Ok(CaseService::new(
        cfg,
        store,
        hospitals,
        Arc::new(StaticUserDirectory::new()),
    ))
}

fn print_summary(view: &CaseView) {
    let case = &view.case;
    println!(
        "{}  {}  {:<24} {:<12} {} line(s)  {}  [{}]",
        case.id(),
        case.schedule().surgery_date,
        case.patient().name,
        case.status().label(),
        view.totals.count,
        view.totals.total_value,
        view.hospital_name.as_deref().unwrap_or("unknown hospital"),
    );
}

fn print_detail(view: &CaseView) {
    let case = &view.case;
    println!("Case:       {}", case.id());
    println!("Patient:    {}", case.patient().name);
    println!(
        "Hospital:   {}",
        view.hospital_name.as_deref().unwrap_or("unknown hospital")
    );
    println!("Date:       {}", case.schedule().surgery_date);
    println!("Status:     {}", case.status().label());
    let flags = case.flags();
    println!(
        "Flags:      operated={} billed={} paid={}",
        flags.is_operated, flags.is_billed, flags.is_paid
    );
    println!("Assistant:  {}", view.assistant_display_name);
    if let Some(diagnosis) = case.diagnosis() {
        println!("Diagnosis:  {}", diagnosis);
    }
    println!("Procedures:");
    for line in ProcedureLedger::ordered(case.procedures()) {
        println!(
            "  {}. {} {} ({}) {} x {} = {}",
            line.order + 1,
            line.surgery_code,
            line.surgery_name,
            line.specialty,
            line.rvu,
            line.hospital_factor,
            line.calculated_value
        );
    }
    println!(
        "Total:      {} RVU, {}",
        view.totals.total_rvu, view.totals.total_value
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Hospitals(command)) => {
            let cfg = core_config()?;
            let registry = HospitalRegistry::open(cfg.hospitals_file())?;
            match command {
                HospitalCommands::List => {
                    let hospitals = registry.list()?;
                    if hospitals.is_empty() {
                        println!("No hospitals registered.");
                    }
                    for h in hospitals {
                        println!(
                            "ID: {}, Name: {}, Location: {}, Rate: {}",
                            h.id,
                            h.name,
                            h.location.as_deref().unwrap_or("-"),
                            h.rate_multiplier
                        );
                    }
                }
                HospitalCommands::Seed { file } => {
                    let seeds: Vec<HospitalSeed> = read_yaml(&file)?
                        .ok_or_else(|| format!("seed file not found: {}", file.display()))?;
                    let added = registry.seed(seeds)?;
                    println!("Registered {} hospital(s).", added.len());
                    for h in added {
                        println!("ID: {}, Name: {}", h.id, h.name);
                    }
                }
                HospitalCommands::SetRate { hospital, rate } => {
                    let updated = registry.set_rate_multiplier(hospital, rate)?;
                    println!(
                        "Set rate multiplier of {} to {}",
                        updated.name, updated.rate_multiplier
                    );
                }
            }
        }
        Some(Commands::Cases(command)) => {
            let service = case_service(core_config()?)?;
            match command {
                CaseCommands::List {
                    user,
                    status,
                    assisted,
                    search,
                } => {
                    let status = status
                        .as_deref()
                        .map(str::parse::<CaseStatus>)
                        .transpose()?;
                    let filter = CaseFilter {
                        status,
                        search,
                        assisted_only: assisted,
                        ..CaseFilter::default()
                    };
                    let views = service.list_cases(user.user, &filter)?;
                    if views.is_empty() {
                        println!("No cases found.");
                    }
                    for view in &views {
                        print_summary(view);
                    }
                }
                CaseCommands::Show { id, user } => {
                    let view = service.get_case(id, user.user)?;
                    print_detail(&view);
                }
                CaseCommands::Stats { user } => {
                    let stats = service.stats(user.user)?;
                    println!(
                        "Cases: {}, Procedures: {}, Total value: {}",
                        stats.total_cases, stats.total_procedures, stats.total_value
                    );
                    for s in &stats.by_status {
                        println!("  {:<12} {:>4}  {}", s.status.label(), s.count, s.total_value);
                    }
                    if !stats.top_specialties.is_empty() {
                        println!("Top specialties:");
                        for s in &stats.top_specialties {
                            println!("  {:<20} {:>4}  {}", s.specialty, s.count, s.total_value);
                        }
                    }
                }
            }
        }
        Some(Commands::Quote {
            rvu,
            hospital,
            factor,
        }) => {
            let service = case_service(core_config()?)?;
            let quote = service.quote(rvu, hospital, factor)?;
            println!("{} RVU x {} = {}", quote.rvu, quote.factor, quote.value);
        }
        None => {
            println!("Use 'medico --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_with_factor() {
        let cli =
            Cli::try_parse_from(["medico", "quote", "--rvu", "10", "--factor", "1.5"]).unwrap();
        match cli.command {
            Some(Commands::Quote { rvu, factor, hospital }) => {
                assert_eq!(rvu, Decimal::from(10));
                assert_eq!(factor, Some(Decimal::new(15, 1)));
                assert!(hospital.is_none());
            }
            _ => panic!("expected quote"),
        }
    }

    #[test]
    fn quote_rejects_hospital_and_factor_together() {
        let hospital = HospitalId::new().to_string();
        let result = Cli::try_parse_from([
            "medico", "quote", "--rvu", "10", "--factor", "2", "--hospital", &hospital,
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn case_commands_require_a_valid_user() {
        assert!(Cli::try_parse_from(["medico", "cases", "stats"]).is_err());
        assert!(Cli::try_parse_from(["medico", "cases", "stats", "--user", "nope"]).is_err());

        let user = UserId::new().to_string();
        let cli = Cli::try_parse_from(["medico", "cases", "list", "--user", &user, "--assisted"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Cases(CaseCommands::List { assisted: true, .. }))
        ));
    }
}
