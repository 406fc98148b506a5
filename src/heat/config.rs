//! 热模拟配置

use bevy::prelude::*;

/// 环境变量：演示运行的 tick 数
pub const TICKS_ENV: &str = "SHIPHEAT_TICKS";

/// 热模拟参数
#[derive(Resource, Debug, Clone)]
pub struct HeatSimConfig {
    /// 储热比例达到该值时开始排热
    pub vent_start_ratio: f32,
    /// 排热时储热比例降到该值以下结束排热
    pub vent_stop_ratio: f32,
    /// 每排出 1 单位热量产生的损耗
    pub depletion_per_purged_heat: f32,
    /// 不排热时每个 tick 恢复的损耗
    pub depletion_recovery_per_tick: f32,
    /// 状态日志间隔（tick）
    pub report_interval: u64,
    /// 演示运行的 tick 数
    pub ticks: u64,
}

impl Default for HeatSimConfig {
    fn default() -> Self {
        Self {
            vent_start_ratio: 0.9,
            vent_stop_ratio: 0.1,
            depletion_per_purged_heat: 0.05,
            depletion_recovery_per_tick: 0.25,
            report_interval: 20,
            ticks: 200,
        }
    }
}

impl HeatSimConfig {
    /// 从命令行参数和环境变量读取配置
    ///
    /// 优先级：`--ticks <n>` / `-t <n>` > `SHIPHEAT_TICKS` > 默认值
    pub fn from_env_and_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let env = std::env::var(TICKS_ENV).ok();
        Self::from_sources(&args, env.as_deref())
    }

    /// 从给定的参数和环境变量值构造
    pub fn from_sources(args: &[String], env_ticks: Option<&str>) -> Self {
        let mut config = Self::default();

        if let Some(ticks) = parse_ticks_arg(args) {
            info!("Using tick count from command line: {}", ticks);
            config.ticks = ticks;
            return config;
        }

        if let Some(value) = env_ticks {
            match value.trim().parse::<u64>() {
                Ok(ticks) => {
                    info!("Using tick count from environment: {}", ticks);
                    config.ticks = ticks;
                    return config;
                }
                Err(_) => warn!("Ignoring invalid {}={:?}", TICKS_ENV, value),
            }
        }

        info!("Using default tick count: {}", config.ticks);
        config
    }
}

/// 查找 `--ticks <n>` 或 `-t <n>`
fn parse_ticks_arg(args: &[String]) -> Option<u64> {
    for i in 0..args.len() {
        if (args[i] == "--ticks" || args[i] == "-t") && i + 1 < args.len() {
            match args[i + 1].parse::<u64>() {
                Ok(ticks) => return Some(ticks),
                Err(_) => warn!("Ignoring invalid tick count {:?}", args[i + 1]),
            }
        }
    }
    None
}
