use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chimera_engine::{ClassDef, Engine, HostClassDef, HostTag, Realm, StrictnessPolicy, TypeId};

fn host_realm() -> Realm {
    let mut realm = Realm::new();
    let element = realm
        .register_host_class(HostClassDef::abstract_class("Element"))
        .unwrap();
    realm
        .register_host_class(
            HostClassDef::new("box", "Box")
                .extends(element)
                .instance_value("volume", 10),
        )
        .unwrap();
    realm
}

fn user_chain(realm: &mut Realm, depth: usize, members: usize) -> TypeId {
    let mut leaf: Option<TypeId> = None;
    for level in 0..depth {
        let mut class = ClassDef::new(&format!("Level{level}"));
        if let Some(parent) = leaf {
            class = class.extends(parent);
        }
        for i in 0..members {
            class = class.value(format!("field{i}"), i as f64);
        }
        leaf = Some(realm.define_class(class).unwrap());
    }
    leaf.unwrap()
}

fn bench_cached_fusion(c: &mut Criterion) {
    let mut realm = host_realm();
    let leaf = user_chain(&mut realm, 3, 0);
    let engine = Engine::capture(&realm);
    let tag = HostTag::new("box");

    c.bench_function("fuse_cached_bridge", |b| {
        b.iter(|| {
            let obj = realm.create_instance(&tag).unwrap();
            let composite = engine.fuse(&mut realm, black_box(obj), leaf).unwrap();
            realm.dispose(obj).unwrap();
            composite.identity
        });
    });
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for policy in StrictnessPolicy::ALL {
        let mut realm = host_realm();
        let leaf = user_chain(&mut realm, 4, 16);
        let engine = Engine::capture(&realm);
        engine.configure(&realm, policy, None).unwrap();
        let tag = HostTag::new("box");

        group.bench_with_input(BenchmarkId::new("members", policy), &leaf, |b, &leaf| {
            b.iter(|| {
                let obj = realm.create_instance(&tag).unwrap();
                let composite = engine.fuse(&mut realm, black_box(obj), leaf).unwrap();
                realm.dispose(obj).unwrap();
                composite.merge.defined.len()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cached_fusion, bench_merge);
criterion_main!(benches);
