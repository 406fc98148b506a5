//! 热网格注册表
//!
//! 全局资源，按网格 ID 管理所有热网络，并记录每个成员属于哪个网格

use std::collections::HashMap;

use bevy::prelude::*;

use super::flags::HeatRole;
use super::members::HeatMembers;
use super::net::ShipHeatNet;

/// 热网格注册表
#[derive(Resource, Debug, Default)]
pub struct HeatGrids {
    /// 网格 ID -> 热网络
    nets: HashMap<u32, ShipHeatNet>,
    /// 成员 -> 所属网格 ID
    membership: HashMap<Entity, u32>,
}

impl HeatGrids {
    /// 创建网格（已存在时返回现有网络）
    pub fn create_grid(&mut self, grid_id: u32) -> &mut ShipHeatNet {
        self.nets
            .entry(grid_id)
            .or_insert_with(|| ShipHeatNet::new(grid_id))
    }

    /// 拆除网格
    ///
    /// 所有成员先断开（散热槽取回各自份额），再丢弃网络
    pub fn remove_grid<M: HeatMembers + ?Sized>(
        &mut self,
        members: &mut M,
        grid_id: u32,
    ) -> Option<ShipHeatNet> {
        let mut net = self.nets.remove(&grid_id)?;
        for member in net.members() {
            net.deregister_all(members, member);
            self.membership.remove(&member);
        }
        info!("Removed heat grid {}", grid_id);
        Some(net)
    }

    /// 将成员接入网格
    ///
    /// 已在其他网格中时先断开；已在同一网格中时返回 None
    pub fn attach<M: HeatMembers + ?Sized>(
        &mut self,
        members: &mut M,
        grid_id: u32,
        member: Entity,
    ) -> Option<HeatRole> {
        match self.membership.get(&member).copied() {
            Some(current) if current == grid_id => return None,
            Some(_) => {
                self.detach(members, member);
            }
            None => {}
        }

        let role = self.create_grid(grid_id).register(members, member);
        self.membership.insert(member, grid_id);
        Some(role)
    }

    /// 将成员从所属网格断开，返回原网格 ID
    pub fn detach<M: HeatMembers + ?Sized>(&mut self, members: &mut M, member: Entity) -> Option<u32> {
        let grid_id = self.membership.remove(&member)?;
        match self.nets.get_mut(&grid_id) {
            Some(net) => net.deregister_all(members, member),
            None => warn!("Member {:?} pointed at missing heat grid {}", member, grid_id),
        }
        Some(grid_id)
    }

    /// 成员所属网格
    pub fn grid_of(&self, member: Entity) -> Option<u32> {
        self.membership.get(&member).copied()
    }

    /// 成员所属网络（可变）
    pub fn net_of_mut(&mut self, member: Entity) -> Option<&mut ShipHeatNet> {
        let grid_id = self.grid_of(member)?;
        self.nets.get_mut(&grid_id)
    }

    pub fn get(&self, grid_id: u32) -> Option<&ShipHeatNet> {
        self.nets.get(&grid_id)
    }

    pub fn get_mut(&mut self, grid_id: u32) -> Option<&mut ShipHeatNet> {
        self.nets.get_mut(&grid_id)
    }

    /// 所有已登记的 (成员, 网格 ID)
    pub fn memberships(&self) -> impl Iterator<Item = (Entity, u32)> + '_ {
        self.membership.iter().map(|(&e, &id)| (e, id))
    }

    /// 按网格 ID 升序排列
    pub fn grid_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.nets.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn nets_mut(&mut self) -> impl Iterator<Item = &mut ShipHeatNet> {
        self.nets.values_mut()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}
