use allocator_api2::boxed::Box;
use allocator_api2::vec::Vec;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tg_alloc::descriptor::DescriptorTable;
use tg_alloc::feature::{Feature, FeaturePack, Features, GeneralFeatures, LocalFeatures};
use tg_alloc::pack::Pack;
use tg_alloc::rank;
use tg_alloc::resource::AnyAlloc;
use tg_alloc::standard::StandardAndPolymorphic;

fn bench_select(c: &mut Criterion) {
    let table = DescriptorTable::of::<StandardAndPolymorphic>();
    let requested = FeaturePack::of(&[Feature::Stateful, Feature::Sync]);
    c.bench_function("select_local", |b| {
        b.iter(|| rank::select(&table, black_box(&LocalFeatures::PACK)))
    });
    c.bench_function("select_matching", |b| {
        b.iter(|| rank::select(&table, black_box(&requested)))
    });
}

fn bench_pack_select(c: &mut Criterion) {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let requested = FeaturePack::of(&[Feature::Stateful, Feature::Sync]);
    c.bench_function("pack_select_general", |b| {
        b.iter(|| pack.select_matching(black_box(&GeneralFeatures::PACK)))
    });
    c.bench_function("pack_allocator_matching", |b| {
        b.iter(|| pack.allocator_matching(black_box(&requested)))
    });
}

fn bench_pack_alloc_dealloc(c: &mut Criterion) {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let mut n: usize = 0;
    c.bench_function("pack_general_alloc_dealloc", |b| {
        let alloc = pack.general_allocator();
        b.iter(|| {
            let x = Box::new_in(n, alloc);
            n = n.wrapping_add(*x);
        })
    });
    c.bench_function("pack_local_alloc_dealloc", |b| {
        let alloc = pack.local_allocator();
        b.iter(|| {
            let x = Box::new_in(n, alloc);
            n = n.wrapping_add(*x);
        })
    });
}

fn bench_pack_make(c: &mut Criterion) {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    c.bench_function("pack_local_make", |b| {
        b.iter(|| {
            let vec: Vec<u64, AnyAlloc> = pack.local(black_box(16usize));
            vec
        })
    });
}

criterion_group!(benches, bench_select, bench_pack_select, bench_pack_alloc_dealloc, bench_pack_make);
criterion_main!(benches);
