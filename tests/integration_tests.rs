use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn assembles_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("factorial.bin");

    let mut cmd = Command::cargo_bin("easm").unwrap();
    cmd.arg("tests/files/factorial.asm").arg(&out);
    cmd.assert()
        .success()
        .stdout(contains("Assembling"))
        .stdout(contains("emit 37 bytes"));

    let expected = ecpu::assemble(include_str!("files/factorial.asm")).unwrap();
    assert_eq!(fs::read(&out).unwrap(), expected);
}

#[test]
fn prints_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("easm").unwrap();
    cmd.arg("tests/files/factorial.asm")
        .arg(dir.path().join("out.bin"))
        .arg("--minimal")
        .arg("--symbols");
    cmd.assert()
        .success()
        .stdout(contains("0x000d LOOP"))
        .stdout(contains("0x001d STEP"))
        .stdout(contains("0x0024 RESULT"))
        .stdout(contains("37 bytes"));
}

#[test]
fn assembly_error_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bad.bin");

    let mut cmd = Command::cargo_bin("easm").unwrap();
    cmd.arg("tests/files/bad_mnemonic.asm").arg(&out);
    cmd.assert().failure().code(1).stderr(contains("FOO"));
    assert!(!out.exists());
}

#[test]
fn assembler_usage_errors() {
    let mut cmd = Command::cargo_bin("easm").unwrap();
    cmd.arg("only_one_argument.asm");
    cmd.assert().failure().code(1);

    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("easm").unwrap();
    cmd.arg("tests/files/does_not_exist.asm")
        .arg(dir.path().join("out.bin"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Cannot open input file"));
}

#[test]
fn runs_binary_image() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("factorial.bin");
    fs::write(
        &image,
        ecpu::assemble(include_str!("files/factorial.asm")).unwrap(),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("ecpu").unwrap();
    cmd.arg(&image);
    cmd.assert()
        .success()
        .stdout(contains("Halted"))
        .stdout(contains("A:120 B:1 C:1 D:120"))
        .stdout(contains("Z:1 S:0 C:0 O:0"));
}

#[test]
fn runs_source_directly() {
    let mut cmd = Command::cargo_bin("ecpu").unwrap();
    cmd.arg("tests/files/stack.asm").arg("--minimal");
    cmd.assert()
        .success()
        .stdout("A:3 B:0 C:0 D:0\nPC: d:9 h:0x0009\nSP: d:65533 h:0xfffd\nZ:0 S:0 C:0 O:0\n");
}

#[test]
fn traces_execution() {
    let mut cmd = Command::cargo_bin("ecpu").unwrap();
    cmd.arg("tests/files/factorial.asm")
        .arg("--minimal")
        .arg("--trace");
    cmd.assert()
        .success()
        .stderr(contains("000d CALL 0x001d"))
        .stderr(contains("001d MUL D, C"))
        .stderr(contains("001c HLT"));
}

#[test]
fn invalid_register_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("bad.bin");
    // ADD A, <7>
    fs::write(&image, [0x06, 0x00, 0x07, 0xFF]).unwrap();

    let mut cmd = Command::cargo_bin("ecpu").unwrap();
    cmd.arg(&image);
    cmd.assert()
        .failure()
        .code(1)
        .stdout(contains("Aborted"))
        .stderr(contains("invalid register index 7"));
}

#[test]
fn unknown_opcode_halts_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("soft_end.bin");
    fs::write(&image, [0x03, 0x07, 0xEE]).unwrap();

    let mut cmd = Command::cargo_bin("ecpu").unwrap();
    cmd.arg(&image).arg("--minimal");
    cmd.assert().success().stdout(contains("A:7 B:0 C:0 D:0"));
}

#[test]
fn emulator_usage_errors() {
    let mut cmd = Command::cargo_bin("ecpu").unwrap();
    cmd.assert().failure().code(1);

    let mut cmd = Command::cargo_bin("ecpu").unwrap();
    cmd.arg("tests/files/missing.bin");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Could not open program file"));
}
