/// Integration tests for one-way distribution of full object records
/// from an owning process to its copies.

use std::collections::HashMap;

use ddd_shared::{Direction, ExchangeHandler, Gid, IfItem, ObjectId};
use ddd_test::{register_shared, run_spmd};

const CELL_SIZE: usize = 16;
const OWNER: u8 = 1;
const COPY: u8 = 0;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Application record of a cell, as laid out in exchange buffers
fn cell_record(gid: Gid) -> [u8; CELL_SIZE] {
    let mut record = [0u8; CELL_SIZE];
    record[..8].copy_from_slice(&gid.to_u64().to_le_bytes());
    record[8..12].copy_from_slice(&(gid.counter() as f32 * 0.5).to_le_bytes());
    record[12..].copy_from_slice(&(0xdead_0000u32 | gid.counter() as u32).to_le_bytes());
    record
}

struct CellStore {
    cells: HashMap<Gid, [u8; CELL_SIZE]>,
}

impl ExchangeHandler for CellStore {
    fn gather(&mut self, item: &IfItem<'_>, buffer: &mut [u8]) {
        buffer.copy_from_slice(&self.cells[&item.header.gid()]);
    }

    fn scatter(&mut self, item: &IfItem<'_>, buffer: &[u8]) {
        let Some(cell) = self.cells.get_mut(&item.header.gid()) else {
            panic!("received a record for unknown object {}", item.header.gid());
        };
        cell.copy_from_slice(buffer);
    }
}

#[test]
fn owner_records_reach_every_copy_bit_for_bit() {
    init();
    let results = run_spmd(3, |ddd| {
        let me = ddd.rank();
        let cell = ddd.declare_type("cell", CELL_SIZE).unwrap();
        let priority = if me == 0 { OWNER } else { COPY };

        let mut ids: Vec<ObjectId> = Vec::new();
        for index in 0..50 {
            ids.push(register_shared(ddd, 0, cell, priority, index % 5));
        }
        for id in &ids {
            for other in (0..3).filter(|other| *other != me) {
                let remote = if other == 0 { OWNER } else { COPY };
                ddd.add_coupling(id, other, remote).unwrap();
            }
        }
        let owner_to_copy = ddd.define_interface(&[cell], &[OWNER], &[COPY]).unwrap();

        let mut store = CellStore {
            cells: ids
                .iter()
                .map(|id| {
                    let gid = ddd.objects().header(id).unwrap().gid();
                    let record = if me == 0 { cell_record(gid) } else { [0; CELL_SIZE] };
                    (gid, record)
                })
                .collect(),
        };
        let stats = ddd
            .oneway_x(owner_to_copy, Direction::Forward, CELL_SIZE, &mut store)
            .unwrap();
        (stats, store.cells)
    });

    let (owner_stats, _) = &results[0];
    assert_eq!(owner_stats.items_sent, 100);
    assert_eq!(owner_stats.items_received, 0);
    for (stats, cells) in &results[1..] {
        assert_eq!(stats.items_sent, 0);
        assert_eq!(stats.items_received, 50);
        assert_eq!(cells.len(), 50);
        for (gid, record) in cells {
            assert_eq!(record, &cell_record(*gid), "record of {} differs", gid);
        }
    }
}

#[test]
fn backward_direction_collects_from_copies() {
    init();
    let results = run_spmd(3, |ddd| {
        let me = ddd.rank();
        let cell = ddd.declare_type("cell", 4).unwrap();
        let priority = if me == 0 { OWNER } else { COPY };
        let id = register_shared(ddd, 0, cell, priority, 0);
        for other in (0..3).filter(|other| *other != me) {
            let remote = if other == 0 { OWNER } else { COPY };
            ddd.add_coupling(&id, other, remote).unwrap();
        }
        let interface = ddd.define_interface(&[cell], &[OWNER], &[COPY]).unwrap();

        let mut contributions = Vec::new();
        ddd.oneway(
            interface,
            Direction::Backward,
            4,
            |_, buffer| buffer.copy_from_slice(&(me * 10).to_le_bytes()),
            |_, buffer| {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(buffer);
                contributions.push(u32::from_le_bytes(bytes));
            },
        )
        .unwrap();
        contributions.sort_unstable();
        contributions
    });

    assert_eq!(results[0], vec![10, 20]);
    assert!(results[1].is_empty());
    assert!(results[2].is_empty());
}
