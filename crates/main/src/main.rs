//! 主应用程序入口
//!
//! 装配仓储、服务、在线状态与投递路由，启动 Axum Web 服务。

use std::sync::Arc;

use application::{
    BcryptPasswordHasher, ChatService, ChatServiceDependencies, DeliveryRouter,
    MemoryPresenceRegistry, MessageService, MessageServiceDependencies, SystemClock, UserService,
    UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgChatRepository, PgMessageRepository, PgUserRepository};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, ConnectionRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').last().unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 仓储
    let user_repository = Arc::new(PgUserRepository::new(pg_pool.clone()));
    let chat_repository = Arc::new(PgChatRepository::new(pg_pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool));

    // 基础组件
    let password_hasher: Arc<dyn application::PasswordHasher> = Arc::new(
        config
            .server
            .bcrypt_cost
            .map(BcryptPasswordHasher::new)
            .unwrap_or_default(),
    );
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);

    // 在线状态注册表按进程构造一次，经句柄注入——没有进程级全局变量
    let presence = Arc::new(MemoryPresenceRegistry::new());
    let connections = Arc::new(ConnectionRegistry::new());
    let delivery_router = Arc::new(DeliveryRouter::new(presence.clone(), connections.clone()));

    // 应用层服务；会话服务的事件出口直接接投递路由
    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository: user_repository.clone(),
        password_hasher,
        clock: clock.clone(),
    }));

    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        chat_repository,
        user_directory: user_repository,
        clock: clock.clone(),
        event_sink: delivery_router.clone(),
    }));

    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        message_repository,
        chat_service: chat_service.clone(),
        clock,
    }));

    let state = AppState::new(
        user_service,
        chat_service,
        message_service,
        presence,
        delivery_router,
        connections,
    );

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天服务器启动在 http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
