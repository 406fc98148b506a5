//! 热网络系统
//!
//! 宿主侧的每 tick 逻辑：同步网格连接、热源产热、排热与损耗恢复、状态日志

use std::collections::HashMap;

use bevy::prelude::*;

use super::components::{Flickable, HeatGridLink, HeatPurge, HeatSource};
use super::config::HeatSimConfig;
use super::grid::HeatGrids;

/// 网格连接同步系统
///
/// 把 `HeatGridLink` 的增删改同步到 `HeatGrids`：
/// - 连接被移除或实体已销毁的成员断开
/// - 新连接或改变网格的成员接入
pub fn sync_heat_grid_links(world: &mut World) {
    let mut links = world.query::<(Entity, &HeatGridLink)>();
    let wanted: Vec<(Entity, u32)> = links
        .iter(world)
        .map(|(entity, link)| (entity, link.grid_id))
        .collect();

    world.resource_scope(|world, mut grids: Mut<HeatGrids>| {
        // 第一遍：断开失效的成员
        let stale: Vec<Entity> = grids
            .memberships()
            .filter(|&(entity, grid_id)| {
                world.get::<HeatGridLink>(entity).map(|link| link.grid_id) != Some(grid_id)
            })
            .map(|(entity, _)| entity)
            .collect();

        for entity in stale {
            if let Some(grid_id) = grids.detach(world, entity) {
                debug!("Detached {:?} from heat grid {}", entity, grid_id);
            }
        }

        // 第二遍：接入新成员
        for (entity, grid_id) in wanted {
            if let Some(role) = grids.attach(world, grid_id, entity) {
                debug!("Attached {:?} to heat grid {} as {:?}", entity, grid_id, role);
            }
        }

        // 第三遍：清理空网格
        let empty: Vec<u32> = grids
            .grid_ids()
            .into_iter()
            .filter(|&id| grids.get(id).is_some_and(|net| net.is_empty()))
            .collect();
        for grid_id in empty {
            grids.remove_grid(world, grid_id);
        }
    });
}

/// 热源系统
///
/// 开关打开（或没有开关）的热源向所属网络注入热量。
/// 网络没有散热槽或已满时不再注入
pub fn heat_source_system(
    sources: Query<(Entity, &HeatSource, Option<&Flickable>)>,
    mut grids: ResMut<HeatGrids>,
) {
    for (entity, source, flick) in &sources {
        if !flick.is_none_or(|f| f.switch_on) {
            continue;
        }
        let Some(net) = grids.net_of_mut(entity) else {
            continue;
        };
        if net.storage_capacity_raw() > 0.0 && net.storage_used() < net.storage_capacity() {
            net.add_heat(source.heat_per_tick);
        }
    }
}

/// 排热系统
///
/// - 储热比例达到阈值的网络开始排热，同时清除炮塔强制目标
/// - 排热中的网络由排热口排出热量并累积损耗
/// - 储热比例降到阈值以下时结束排热
/// - 未排热的网络逐步恢复损耗
pub fn venting_system(world: &mut World) {
    let config = world.resource::<HeatSimConfig>().clone();

    let mut purges = world.query::<(Entity, &HeatPurge)>();
    let purge_rates: HashMap<Entity, f32> = purges
        .iter(world)
        .map(|(entity, purge)| (entity, purge.purge_per_tick))
        .collect();

    world.resource_scope(|world, mut grids: Mut<HeatGrids>| {
        for net in grids.nets_mut() {
            let ratio = net.ratio_in_network();
            if !net.is_venting() && ratio >= config.vent_start_ratio {
                info!("Heat grid {} starts venting at {:.0}%", net.grid_id, ratio * 100.0);
                net.start_vent(world);
                net.turrets_off(world);
            }

            if net.is_venting() {
                let capacity: f32 = net
                    .heat_purges()
                    .iter()
                    .filter_map(|purge| purge_rates.get(purge))
                    .sum();
                let purged = capacity.min(net.storage_used());
                net.remove_heat(purged);
                net.add_depletion(purged * config.depletion_per_purged_heat);

                if net.ratio_in_network() <= config.vent_stop_ratio {
                    net.end_vent(world);
                    info!("Heat grid {} stops venting", net.grid_id);
                }
            } else if config.depletion_recovery_per_tick > 0.0 && net.depletion() > 0.0 {
                net.remove_depletion(config.depletion_recovery_per_tick);
            }
        }
    });
}

/// 状态日志系统
///
/// 每隔 `report_interval` 个 tick 输出每个网络的状态
pub fn heat_report_system(world: &mut World, mut tick: Local<u64>) {
    *tick += 1;
    let interval = world.resource::<HeatSimConfig>().report_interval;
    if interval == 0 || *tick % interval != 0 {
        return;
    }

    world.resource_scope(|world, mut grids: Mut<HeatGrids>| {
        for grid_id in grids.grid_ids() {
            let Some(net) = grids.get_mut(grid_id) else {
                continue;
            };
            let capacity = net.storage_capacity();
            let ratio = net.ratio_in_network();
            let depletion_ratio = net.depletion_ratio();
            info!(
                "tick {} grid {}: heat {:.1}/{:.1} ({:.0}%), depletion {:.1} ({:.0}%), venting {}, shields {}, cloak {}",
                *tick,
                grid_id,
                net.storage_used(),
                capacity,
                ratio * 100.0,
                net.depletion(),
                depletion_ratio * 100.0,
                net.is_venting(),
                net.any_shield_on(world),
                net.any_cloak_on(world)
            );
        }
    });
}
