use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::{Purge, spawn_sweeper};
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub sign_in_service: Arc<dyn SignInService>,
    pub refresh_service: Arc<dyn SessionRefreshService>,
    pub admin_service: Arc<dyn AdminService>,
    pub token_service: Arc<dyn TokenService>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cancel = CancellationToken::new();
        let mut sweep_targets: Vec<Arc<dyn Purge>> = Vec::new();

        let cache: Arc<dyn EphemeralCache> = match settings.cache.backend.as_str() {
            "memory" => {
                let cache = Arc::new(InMemoryCache::new(clock.clone()));
                sweep_targets.push(cache.clone());
                cache
            }
            "redis" => {
                let dsn = settings
                    .cache
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("cache.redis_dsn is required for the redis backend"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisCache::new(redis_manager, settings.cache.prefix.clone()))
            }
            other => return Err(anyhow!("Unknown cache backend: {}", other)),
        };

        let mut pool = None;
        let (accounts, refresh_tokens): (Arc<dyn AccountStore>, Arc<dyn RefreshTokenStore>) =
            match settings.accounts.backend.as_str() {
                "memory" => {
                    let store = Arc::new(InMemoryRefreshTokenStore::new(clock.clone()));
                    sweep_targets.push(store.clone());
                    let refresh_tokens: Arc<dyn RefreshTokenStore> = store;
                    let accounts: Arc<dyn AccountStore> =
                        Arc::new(Self::seeded_memory_store(settings)?);
                    (accounts, refresh_tokens)
                }
                "mysql" => {
                    let dsn = settings.accounts.mysql_dsn.as_deref().ok_or_else(|| {
                        anyhow!("accounts.mysql_dsn is required for the mysql backend")
                    })?;
                    let mysql = Pool::<MySql>::connect(dsn).await?;
                    pool = Some(mysql.clone());
                    let accounts: Arc<dyn AccountStore> =
                        Arc::new(MySqlAccountStore::new(mysql.clone()));
                    let refresh_tokens: Arc<dyn RefreshTokenStore> =
                        Arc::new(MySqlRefreshTokenStore::new(mysql));
                    (accounts, refresh_tokens)
                }
                other => return Err(anyhow!("Unknown accounts backend: {}", other)),
            };

        let sweeper_handle = (!sweep_targets.is_empty()).then(|| {
            spawn_sweeper(
                sweep_targets,
                Duration::from_secs(settings.cache.sweep_interval_secs.max(1)),
                cancel.clone(),
            )
        });

        let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
            issuer: settings.jwt.issuer.clone(),
            audience: settings.jwt.audience.clone(),
            expire_minutes: settings.jwt.expire_minutes,
            signing_key: settings.jwt.signing_key.clone().into_bytes(),
        }));
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(Argon2CredentialVerifier::new());

        let throttle = Arc::new(LoginThrottle::new(
            accounts.clone(),
            cache.clone(),
            verifier,
            token_service.clone(),
            refresh_tokens,
            clock.clone(),
            ThrottleConfig {
                policy: settings.lockout,
                session_safety_margin: settings.session.safety_margin(),
                upstream_timeout: settings.session.upstream_timeout(),
                refresh_token_lifetime: settings.jwt.refresh_lifetime(),
            },
        ));
        let admin_service: Arc<dyn AdminService> =
            Arc::new(RealAdminService::new(accounts, cache, clock));

        info!(
            cache = %settings.cache.backend,
            accounts = %settings.accounts.backend,
            "server started"
        );

        Ok(Self {
            sign_in_service: throttle.clone(),
            refresh_service: throttle,
            admin_service,
            token_service,
            sweeper_handle: Mutex::new(sweeper_handle),
            cancel,
            pool,
        })
    }

    /// Assemble a server around ready-made services. No background tasks run.
    pub fn with_services(
        sign_in_service: Arc<dyn SignInService>,
        refresh_service: Arc<dyn SessionRefreshService>,
        admin_service: Arc<dyn AdminService>,
        token_service: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            sign_in_service,
            refresh_service,
            admin_service,
            token_service,
            sweeper_handle: Mutex::new(None),
            cancel: CancellationToken::new(),
            pool: None,
        }
    }

    fn seeded_memory_store(settings: &Settings) -> anyhow::Result<InMemoryAccountStore> {
        let store = InMemoryAccountStore::new();
        for seed in &settings.accounts.seed {
            let hash = Argon2CredentialVerifier::hash_password(&seed.password)
                .map_err(|e| anyhow!(e))?;
            let account = AccountRecord::new(
                AccountId(uuid::Uuid::new_v4()),
                Email::new(&seed.email),
                hash,
            );
            debug!(account = %account.email.fingerprint(), "seeded account");
            store.insert(account, seed.roles.clone());
        }
        Ok(store)
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self
            .sweeper_handle
            .lock()
            .ok()
            .and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
