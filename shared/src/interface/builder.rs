use std::cmp::Reverse;

use crate::{
    interface::{
        definition::InterfaceDef,
        descriptor::{IfAttrBucket, IfDirection, IfEntry, IfProcBucket},
    },
    registry::ObjectRegistry,
    ProcId,
};

/// Builds the process buckets of an interface from the current couplings.
///
/// Entries are sorted by (remote process, canonical direction, attribute
/// descending, GID ascending). Every input of that key is known identically
/// on both ends of a coupling, so two processes derive positionally aligned
/// sequences without negotiating.
pub(crate) fn build(def: &InterfaceDef, objects: &ObjectRegistry) -> Vec<IfProcBucket> {
    let me = objects.rank();
    let mut selected: Vec<(ProcId, IfEntry)> = Vec::new();

    for (object, header, couplings) in objects.coupled_objects() {
        if !def.types.contains(&header.ddd_type()) {
            continue;
        }
        let local = header.priority();
        for coupling in couplings {
            let remote = coupling.priority();
            let ab = def.a.contains(&local) && def.b.contains(&remote);
            let ba = def.b.contains(&local) && def.a.contains(&remote);
            let direction = match (ab, ba) {
                (true, true) => IfDirection::ABA,
                (true, false) => IfDirection::AB,
                (false, true) => IfDirection::BA,
                (false, false) => continue,
            };
            selected.push((
                coupling.proc(),
                IfEntry {
                    object,
                    gid: header.gid(),
                    attr: header.attr(),
                    local_priority: local,
                    remote_priority: remote,
                    direction,
                },
            ));
        }
    }

    selected.sort_unstable_by_key(|(proc, entry)| {
        (
            *proc,
            entry.direction.canonical_rank(me, *proc),
            Reverse(entry.attr),
            entry.gid,
        )
    });

    partition(selected)
}

fn partition(selected: Vec<(ProcId, IfEntry)>) -> Vec<IfProcBucket> {
    let mut buckets: Vec<IfProcBucket> = Vec::new();

    for (proc, entry) in selected {
        let start_new = buckets.last().map_or(true, |bucket| bucket.proc != proc);
        if start_new {
            buckets.push(IfProcBucket {
                proc,
                entries: Vec::new(),
                attrs: Vec::new(),
                n_ab: 0,
                n_ba: 0,
                n_aba: 0,
            });
        }
        let Some(bucket) = buckets.last_mut() else {
            unreachable!("bucket was just pushed");
        };
        match entry.direction {
            IfDirection::AB => bucket.n_ab += 1,
            IfDirection::BA => bucket.n_ba += 1,
            IfDirection::ABA => bucket.n_aba += 1,
        }
        bucket.entries.push(entry);
    }

    for bucket in &mut buckets {
        bucket.attrs = attr_buckets(&bucket.entries);
    }

    buckets
}

// entries are grouped by direction, and by descending attribute within each group
fn attr_buckets(entries: &[IfEntry]) -> Vec<IfAttrBucket> {
    let mut attrs: Vec<IfAttrBucket> = Vec::new();
    let mut run_start = 0;

    for index in 1..=entries.len() {
        let run_ends = index == entries.len()
            || entries[index].direction != entries[run_start].direction
            || entries[index].attr != entries[run_start].attr;
        if !run_ends {
            continue;
        }

        let first = &entries[run_start];
        let position = match attrs.binary_search_by_key(&Reverse(first.attr), |b| Reverse(b.attr)) {
            Ok(position) => position,
            Err(position) => {
                attrs.insert(position, IfAttrBucket::new(first.attr));
                position
            }
        };
        let range = run_start..index;
        let bucket = &mut attrs[position];
        match first.direction {
            IfDirection::AB => bucket.ab = range,
            IfDirection::BA => bucket.ba = range,
            IfDirection::ABA => bucket.aba = range,
        }
        run_start = index;
    }

    attrs
}
