use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use jjz_renewal::clients::{HttpCaptchaSolver, IdentityProviderClient, PermitApi, PermitApiClient};
use jjz_renewal::config::{EnvironmentConfig, UserConfig, UserConfigStore};
use jjz_renewal::models::vehicle::{DEFAULT_PLATE_TYPE, DEFAULT_VEHICLE_TYPE};
use jjz_renewal::models::{FormVersion, VehicleRecord};
use jjz_renewal::services::{run_batch, NotificationService, RenewalOptions, RenewalReport, RenewalService};
use jjz_renewal::utils::crypto::RsaPkcs1Cipher;
use jjz_renewal::utils::dates::{beijing_now, beijing_today};
use jjz_renewal::utils::errors::AppResult;

#[derive(Parser, Debug)]
#[command(name = "jjz_renewal", about = "Renovación automática del 进京证", version)]
struct Cli {
    /// Fichero de usuarios (por defecto USERS_FILE)
    #[arg(long, global = true)]
    users: Option<PathBuf>,
    /// Versión del formulario de solicitud: v1 o v2
    #[arg(long, global = true, value_parser = parse_form_version)]
    form_version: Option<FormVersion>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Renovar para todos los usuarios (comando por defecto)
    Run,
    /// Consultar el estado y la decisión sin enviar ni notificar
    Status,
    /// Listar los vehículos registrados de cada usuario
    Vehicles,
    /// Registrar un vehículo para el primer usuario configurado
    AddVehicle(AddVehicleArgs),
    /// Eliminar un vehículo del primer usuario configurado
    RemoveVehicle {
        /// vId del vehículo
        vehicle_id: String,
    },
}

#[derive(Args, Debug)]
struct AddVehicleArgs {
    /// Matrícula (号牌号码)
    plate: String,
    /// Número de motor (发动机号)
    #[arg(long)]
    engine: String,
    /// Código de tipo de placa (号牌种类)
    #[arg(long, default_value = DEFAULT_PLATE_TYPE)]
    plate_type: String,
    /// Código de tipo de vehículo (车辆类型)
    #[arg(long, default_value = DEFAULT_VEHICLE_TYPE)]
    vehicle_type: String,
    /// Marca y modelo (品牌型号)
    #[arg(long, default_value = "")]
    brand: String,
    /// Fecha de registro YYYY-MM-DD
    #[arg(long, default_value = "")]
    registered: String,
}

impl AddVehicleArgs {
    fn into_vehicle(self) -> VehicleRecord {
        VehicleRecord {
            license_number: self.plate,
            engine_number: self.engine,
            license_plate_type: self.plate_type,
            vehicle_type: self.vehicle_type,
            brand_model: self.brand,
            registration_date: self.registered,
            ..VehicleRecord::default()
        }
    }
}

fn parse_form_version(raw: &str) -> Result<FormVersion, String> {
    FormVersion::from_name(raw).ok_or_else(|| format!("'{raw}' is not a form version (v1 or v2)"))
}

/// Clientes de un usuario; cada pipeline tiene los suyos
struct UserClients {
    api: PermitApiClient,
    notifier: NotificationService,
    identity: Option<IdentityProviderClient>,
}

impl UserClients {
    fn new(env: &EnvironmentConfig, user: &UserConfig) -> AppResult<Self> {
        let identity = match &env.ocr_url {
            Some(ocr_url) => Some(IdentityProviderClient::new(
                &env.bjt_url,
                Arc::new(HttpCaptchaSolver::new(ocr_url)?),
                Arc::new(RsaPkcs1Cipher),
            )),
            None => None,
        };

        Ok(Self {
            api: PermitApiClient::new(&env.jtgl_url)?,
            notifier: NotificationService::new(&user.notify_urls),
            identity,
        })
    }

    fn service<'a>(&'a self, store: &'a UserConfigStore, options: RenewalOptions) -> RenewalService<'a> {
        let service = RenewalService::new(&self.api, &self.notifier, options).with_store(store);
        match &self.identity {
            Some(identity) => service.with_identity_provider(identity),
            None => service,
        }
    }
}

async fn renew_user(
    env: &EnvironmentConfig,
    store: &UserConfigStore,
    user: UserConfig,
    options: RenewalOptions,
) -> AppResult<RenewalReport> {
    let clients = UserClients::new(env, &user)?;
    clients
        .service(store, options)
        .run(&user, beijing_today(), beijing_now())
        .await
}

async fn list_vehicles(env: &EnvironmentConfig, store: &UserConfigStore, user: &UserConfig) -> AppResult<()> {
    let clients = UserClients::new(env, user)?;
    let (token, _) = clients.service(store, RenewalOptions::default()).ensure_token(user).await?;

    let vehicles = clients.api.list_vehicles(&token).await?;
    let state = clients.api.fetch_state(&token).await?;
    println!("[{}] {} vehículos", user.name, vehicles.len());
    for vehicle in &vehicles {
        let permit = vehicle
            .vehicle_id
            .as_deref()
            .and_then(|id| state.vehicle_by_id(id))
            .and_then(|status| status.latest_record())
            .map(|record| record.status_description())
            .unwrap_or("-");
        println!(
            "  {} | {} | {} | vId={} | {}",
            vehicle.license_number,
            vehicle.plate_type_name(),
            vehicle.vehicle_type_name(),
            vehicle.vehicle_id_or_empty(),
            permit
        );
    }
    Ok(())
}

async fn add_vehicle(
    env: &EnvironmentConfig,
    store: &UserConfigStore,
    user: &UserConfig,
    vehicle: VehicleRecord,
) -> AppResult<()> {
    let clients = UserClients::new(env, user)?;
    let (token, _) = clients.service(store, RenewalOptions::default()).ensure_token(user).await?;

    let response = clients.api.add_vehicle(&token, &vehicle).await?;
    info!("🚙 [{}] Vehículo {} registrado: {}", user.name, vehicle.license_number, response.msg);
    Ok(())
}

async fn remove_vehicle(
    env: &EnvironmentConfig,
    store: &UserConfigStore,
    user: &UserConfig,
    vehicle_id: &str,
) -> AppResult<()> {
    let clients = UserClients::new(env, user)?;
    let (token, _) = clients.service(store, RenewalOptions::default()).ensure_token(user).await?;

    let response = clients.api.delete_vehicle(&token, vehicle_id).await?;
    info!("🗑️ [{}] Vehículo {} eliminado: {}", user.name, vehicle_id, response.msg);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let cli = Cli::parse();
    let mut env = EnvironmentConfig::from_env()?;
    if let Some(version) = cli.form_version {
        env.form_version = version;
    }

    // Configurar logging
    let level = tracing::Level::from_str(&env.log_level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚗 Renovación automática 进京证");
    info!("================================");

    let users_path = cli.users.unwrap_or_else(|| PathBuf::from(&env.users_file));
    let store = UserConfigStore::new(&users_path);
    let users = store.load().await?;

    if !env.can_login() {
        warn!("⚠️ OCR_URL no configurada: sólo se usarán tokens guardados");
    }

    let env = &env;
    let store_ref = &store;
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let options = RenewalOptions {
                form_version: env.form_version,
                ..RenewalOptions::default()
            };
            let summary = run_batch(users, move |user| renew_user(env, store_ref, user, options)).await;
            if summary.all_failed() {
                return Err(anyhow!("all {} users failed", summary.total()));
            }
        }
        Command::Status => {
            let options = RenewalOptions {
                form_version: env.form_version,
                dry_run: true,
                notify: false,
            };
            for user in users {
                let name = user.name.clone();
                match renew_user(env, store_ref, user, options).await {
                    Ok(report) => {
                        println!("[{}] {}", name, report.outcome.label());
                        if let Some(summary) = &report.summary {
                            println!(
                                "  {}{} | {}至{} | 剩余 {} 天 (sxsyts={})",
                                summary.status,
                                if summary.expired { " (已过期)" } else { "" },
                                summary.start_date,
                                summary.end_date,
                                summary.remaining_days,
                                summary.counted_days
                            );
                        }
                    }
                    Err(e) => error!("❌ [{}] {}", name, e),
                }
            }
        }
        Command::Vehicles => {
            for user in &users {
                if let Err(e) = list_vehicles(env, store_ref, user).await {
                    error!("❌ [{}] {}", user.name, e);
                }
            }
        }
        Command::AddVehicle(args) => {
            let user = users.first().ok_or_else(|| anyhow!("no users configured"))?;
            add_vehicle(env, store_ref, user, args.into_vehicle()).await?;
        }
        Command::RemoveVehicle { vehicle_id } => {
            let user = users.first().ok_or_else(|| anyhow!("no users configured"))?;
            remove_vehicle(env, store_ref, user, &vehicle_id).await?;
        }
    }

    info!("🏁 Terminado");
    Ok(())
}
