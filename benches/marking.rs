//! Benchmarks for link runs.
//!
//! Tests performance of the pipeline on synthetic programs:
//! - Marking a long call chain from an entry point
//! - Marking a program where most types are unreachable
//! - Completing many bridge types that miss interface methods

extern crate cilshrink;

use cilshrink::{metadata::method::CONSTRUCTOR_FLAGS, prelude::*};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;

const PUBLIC_STATIC: u32 = 0x0096;

fn void() -> TypeSig {
    TypeSig::named("mscorlib", "System", "Void")
}

/// `count` static methods, each calling the next one, with `Main` calling the first
fn call_chain(count: usize, unreachable: usize) -> LinkContext {
    let mut program = Program::new();
    let mscorlib = program.add_assembly("mscorlib");
    TypeBuilder::class("System", "Void").build(&mut program, mscorlib).unwrap();
    let app = program.add_assembly("App");

    for i in 0..count {
        let mut instructions = Vec::new();
        if i + 1 < count {
            let next = MethodRef::new(TypeSig::named("App", "App", &format!("Step{}", i + 1)), "Run", void())
                .static_method();
            instructions.push(Instruction::new(OpCode::Call, Operand::Method(next)));
        }
        instructions.push(Instruction::simple(OpCode::Ret));
        TypeBuilder::class("App", &format!("Step{i}"))
            .method(
                MethodDef::new("Run", PUBLIC_STATIC, void())
                    .with_body(MethodBody::from_instructions(instructions)),
            )
            .build(&mut program, app)
            .unwrap();
    }
    for i in 0..unreachable {
        TypeBuilder::class("App", &format!("Unused{i}"))
            .method(MethodDef::new("Run", PUBLIC_STATIC, void()).with_body(MethodBody::new()))
            .build(&mut program, app)
            .unwrap();
    }

    let first = MethodRef::new(TypeSig::named("App", "App", "Step0"), "Run", void()).static_method();
    let main = TypeBuilder::class("App", "Program")
        .method(
            MethodDef::new("Main", PUBLIC_STATIC, void()).with_body(MethodBody::from_instructions(vec![
                Instruction::new(OpCode::Call, Operand::Method(first)),
                Instruction::simple(OpCode::Ret),
            ])),
        )
        .build(&mut program, app)
        .unwrap();
    let entry = program.methods_named(main, "Main").unwrap()[0];
    program.set_entry_point(app, entry).unwrap();

    let mut ctx = LinkContext::new(program, LinkerConfig::default());
    ctx.annotations.set_action(app, AssemblyAction::Link);
    ctx.annotations.set_action(mscorlib, AssemblyAction::Link);
    ctx
}

/// `count` bridge types, each implementing an interface with one missing method
fn incomplete_bridge_types(count: usize) -> LinkContext {
    let mut program = Program::new();
    let mscorlib = program.add_assembly("mscorlib");
    TypeBuilder::class("System", "Void").build(&mut program, mscorlib).unwrap();
    let mono_android = program.add_assembly("Mono.Android");
    TypeBuilder::class("Java.Lang", "Object").build(&mut program, mono_android).unwrap();
    TypeBuilder::class("Java.Lang", "AbstractMethodError")
        .extends(TypeSig::named("Mono.Android", "Java.Lang", "Object"))
        .method(MethodDef::new(".ctor", CONSTRUCTOR_FLAGS, void()).with_body(MethodBody::new()))
        .build(&mut program, mono_android)
        .unwrap();

    let app = program.add_assembly("App");
    TypeBuilder::interface("App", "IAnimal")
        .method(MethodDef::new("Speak", INTERFACE_METHOD_FLAGS, void()))
        .method(MethodDef::new("Sit", INTERFACE_METHOD_FLAGS, void()))
        .build(&mut program, app)
        .unwrap();
    for i in 0..count {
        TypeBuilder::class("App", &format!("Animal{i}"))
            .extends(TypeSig::named("Mono.Android", "Java.Lang", "Object"))
            .implements(TypeSig::named("App", "App", "IAnimal"))
            .build(&mut program, app)
            .unwrap();
    }

    LinkContext::new(program, LinkerConfig::default())
}

/// Benchmark marking a chain of 1000 calls.
fn bench_mark_call_chain(c: &mut Criterion) {
    c.bench_function("mark_call_chain_1000", |b| {
        b.iter_batched(
            || call_chain(1000, 0),
            |mut ctx| {
                let outcome = MarkStep::new().process(black_box(&mut ctx)).unwrap();
                black_box(outcome)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark marking a small reachable set inside a large program.
fn bench_mark_mostly_unreachable(c: &mut Criterion) {
    c.bench_function("mark_10_of_5000", |b| {
        b.iter_batched(
            || call_chain(10, 5000),
            |mut ctx| {
                let outcome = MarkStep::new().process(black_box(&mut ctx)).unwrap();
                black_box(outcome)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark the full pipeline on 500 types that each need two stubs.
fn bench_complete_bridge_types(c: &mut Criterion) {
    c.bench_function("link_complete_500_types", |b| {
        b.iter_batched(
            || incomplete_bridge_types(500),
            |mut ctx| {
                let report = Linker::new().run(black_box(&mut ctx)).unwrap();
                black_box(report)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_mark_call_chain,
    bench_mark_mostly_unreachable,
    bench_complete_bridge_types
);
criterion_main!(benches);
