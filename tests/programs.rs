use ecpu::flags::Flag;
use ecpu::{assemble, AsmParser, RunEnvironment, STACK_TOP};

fn run(src: &str) -> RunEnvironment {
    let image = assemble(src).unwrap();
    let mut env = RunEnvironment::from_raw(&image).unwrap();
    env.run().unwrap();
    env
}

#[test]
fn pushes_land_below_stack_top() {
    let env = run(include_str!("files/stack.asm"));
    let cpu = env.processor();
    assert!(cpu.halted);
    assert_eq!(cpu.pc, 9);
    assert_eq!(cpu.sp, STACK_TOP - 2);
    assert_eq!(env.memory().read(STACK_TOP - 1), 5);
    assert_eq!(env.memory().read(STACK_TOP - 2), 3);
}

#[test]
fn add_carries_out_to_zero() {
    let env = run(
        "
        LDI 1
        MOV B, A
        LDI 255
        ADD A, B
        HLT
        ",
    );
    let cpu = env.processor();
    assert_eq!(cpu.reg[0], 0);
    assert!(cpu.flags.get(Flag::Carry));
    assert!(cpu.flags.get(Flag::Zero));
    assert!(!cpu.flags.get(Flag::Overflow));
}

#[test]
fn factorial_subroutine() {
    let src = include_str!("files/factorial.asm");
    let air = AsmParser::new(src).unwrap().parse().unwrap();
    let result = air.symbols().get("result").unwrap();

    let env = run(src);
    let cpu = env.processor();
    assert_eq!(env.memory().read(result), 120);
    assert_eq!(cpu.reg, [120, 1, 1, 120]);
    assert_eq!(cpu.sp, STACK_TOP);
    assert!(cpu.flags.get(Flag::Zero));
}

#[test]
fn signed_and_unsigned_jumps() {
    let env = run(include_str!("files/compare.asm"));
    assert_eq!(env.processor().reg[0], 42);
    assert_eq!(env.processor().reg[1], (-3i8) as u8);
}

#[test]
fn ret_resumes_after_call_operand() {
    let env = run(
        "
                CALL sub    ; 0x00
        after:  HLT         ; 0x03
        sub:    MOV D, A
                RET
        ",
    );
    assert_eq!(env.processor().pc, 4);
    assert_eq!(env.processor().sp, STACK_TOP);
}

#[test]
fn push_pop_restores_stack_pointer() {
    let env = run(
        "
        LDI 0x5A
        PUSH A
        LDI 0
        POP C
        HLT
        ",
    );
    let cpu = env.processor();
    assert_eq!(cpu.reg[2], 0x5A);
    assert_eq!(cpu.sp, STACK_TOP);
}

#[test]
fn countdown_loop() {
    let env = run(
        "
                LDI 10
                MOV B, A
                LDI 0
        loop:   INC         ; A counts iterations
                MOV C, A
                MOV A, B
                DEC
                MOV B, A
                MOV A, C
                JNZ loop    ; Z is still from the DEC of B
                HLT
        ",
    );
    assert_eq!(env.processor().reg[0], 10);
    assert_eq!(env.processor().reg[1], 0);
}

#[test]
fn assembling_is_deterministic() {
    let src = include_str!("files/factorial.asm");
    assert_eq!(assemble(src).unwrap(), assemble(src).unwrap());
}

#[test]
fn forward_and_backward_references_agree() {
    let forward = assemble(
        "
                JMP target
                NOP
        target: HLT
        ",
    )
    .unwrap();
    assert_eq!(forward, [0x0D, 0x00, 0x04, 0x00, 0xFF]);

    let backward = assemble(
        "
                JMP skip
        target: HLT
        skip:   JMP target
        ",
    )
    .unwrap();
    assert_eq!(&backward[4..], [0x0D, 0x00, 0x03]);
}

#[test]
fn unknown_mnemonic_yields_no_image() {
    let err = assemble(include_str!("files/bad_mnemonic.asm")).unwrap_err();
    assert_eq!(
        err.code().map(|c| c.to_string()).as_deref(),
        Some("parse::unknown_mnemonic")
    );
    assert!(err.to_string().contains("FOO"));
}

#[test]
fn carry_branches_with_punctuated_labels() {
    let src = "
                LDI 200
                MOV B, A
                ADD A, B        ; 400 carries out
                JNC no-carry
                JC  on-carry
                HLT
    no-carry:   LDI 1
                HLT
    on-carry:   LDI 2
                MOV C, A
                LDI 1
                ADD A, B        ; 201, no carry
                JC  no-carry
                JNC $done
                HLT
    $done:      HLT
    ";
    let air = AsmParser::new(src).unwrap().parse().unwrap();
    let done = air.symbols().get("$DONE").unwrap();

    let env = run(src);
    let cpu = env.processor();
    assert_eq!(cpu.reg[2], 2);
    assert_eq!(cpu.reg[0], 201);
    assert!(!cpu.flags.get(Flag::Carry));
    assert_eq!(cpu.pc, done + 1);
}
