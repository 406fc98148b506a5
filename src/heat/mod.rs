//! 舰船热网络模块
//!
//! 相互连通的舰船模块共享一个热网络：
//!
//! - **flags**: 成员能力标志位与角色
//! - **components**: 成员组件（散热槽、热源、护盾、炮塔等）
//! - **members**: 成员表接口（热网络只持有句柄）
//! - **net**: 热网络本体（储热、损耗、惰性比例、排热）
//! - **grid**: 网格注册表（网格 ID -> 热网络）
//! - **config**: 模拟参数
//! - **systems**: ECS 系统函数（成员同步、产热、排热、日志）
//! - **plugin**: Bevy 插件
//! - **demo**: 演示舰船

pub mod components;
pub mod config;
pub mod demo;
pub mod flags;
pub mod grid;
pub mod members;
pub mod net;
pub mod plugin;
pub mod systems;

// 重新导出常用类型，方便外部使用
pub use components::{
    CloakingDevice, CombatShield, Flickable, HeatGridLink, HeatPurge, HeatSink, HeatSource,
    ShipHeat, ShipTurret,
};
pub use config::HeatSimConfig;
pub use demo::DemoShipPlugin;
pub use flags::{HeatCaps, HeatRole};
pub use grid::HeatGrids;
pub use members::HeatMembers;
pub use net::ShipHeatNet;
pub use plugin::{HeatSimSet, ShipHeatPlugin};
