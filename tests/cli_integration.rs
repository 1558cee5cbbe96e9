use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::io::Write;

const ABANDON_ART: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";
const ROOT_XSK: &str = "root_xsk1kpll8e3uzlxjupgyujla225cc3atmcvreng88rhu8p08vn7er49a05ueamhncn0k37kt8ug7ffx525f75832sqv25ddncpu8zn8aemwvcs3ynctesnzyeuuqkjylvtzhlpqgnc2sy3dlf8zrd59ewzw93u2z6hw3";
const UNSIGNED_TX: &str = "84a400818258203b40265111d8bb3c3c608d95b3a0bf83461ace32d79336579a1939b3aad1c0b70001818258390100b7847c89d5721592fc0cc8932f50a8f8258b39b93861140a1b99fbc2f45a16a6685616e566c00fc081fe59f8bd7ab679ee15e9ce2034461a000f4240021a00029151031a02faf080a0f5f6";
const SIGNED_BY_MNEMONIC: &str = "84a400818258203b40265111d8bb3c3c608d95b3a0bf83461ace32d79336579a1939b3aad1c0b70001818258390100b7847c89d5721592fc0cc8932f50a8f8258b39b93861140a1b99fbc2f45a16a6685616e566c00fc081fe59f8bd7ab679ee15e9ce2034461a000f4240021a00029151031a02faf080a100d901028182582063c5d69570349e4233a0575811464f0e8a3fd329abe76e9bdc3d3f1b9598217958406ec71085d61490cb03f524e70fdbc69d0a7d79b0bcf3095958d08214f062afce17504aff360fa36a433605323b698cb38fcc5ed3fac5b26554c170114f66d706f5f6";
const SIGNED_BY_RAW: &str = "84a400818258203b40265111d8bb3c3c608d95b3a0bf83461ace32d79336579a1939b3aad1c0b70001818258390100b7847c89d5721592fc0cc8932f50a8f8258b39b93861140a1b99fbc2f45a16a6685616e566c00fc081fe59f8bd7ab679ee15e9ce2034461a000f4240021a00029151031a02faf080a100d901028182582003a107bff3ce10be1d70dd18e74bc09967e4d6309ba50d5f1ddc8664125531b858402f47ef9cca429b1c0bf926736c1e6ea3625643976a4eab501a2d3d4dba673c0e6a47c66b6c2c67f4775c301a3df7fa6c1ec0571c8729bd438f481b9cfb89ed0cf5f6";

fn signer_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cardano-signer"));
    for key in [
        "CARDANO_SIGNER_MNEMONIC",
        "CARDANO_SIGNER_BECH32",
        "CARDANO_SIGNER_TAG_WITNESS_SET",
        "CARDANO_SIGNER_MAX_TX_BYTES",
        "CARDANO_SIGNER_VERIFY",
        "CARDANO_SIGNER_MASTER_KEY",
        "CARDANO_SIGNER_DEBUG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cardano-signer-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn stdout_of(output: &Output) -> String {
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);
    String::from_utf8(output.stdout.clone()).expect("stdout is utf8").trim().to_string()
}

#[test]
fn signs_with_mnemonic_file() {
    let mnemonic = temp_file("abandon.mnemonic", ABANDON_ART);
    let output = signer_cmd()
        .args(["sign", "--mnemonic-file"])
        .arg(&mnemonic)
        .args(["--path", "m/1852'/1815'/0'/0/0", "--tx", UNSIGNED_TX])
        .output()
        .expect("cli runs");
    assert_eq!(stdout_of(&output), SIGNED_BY_MNEMONIC);
}

#[test]
fn signs_with_env_bech32_and_index_pair() {
    let output = signer_cmd()
        .env("CARDANO_SIGNER_BECH32", ROOT_XSK)
        .args(["sign", "--account", "0", "--index", "0", "--tx", UNSIGNED_TX])
        .output()
        .expect("cli runs");
    assert_eq!(stdout_of(&output), SIGNED_BY_MNEMONIC);
}

#[test]
fn signs_with_skey_envelope_from_stdin() {
    let skey = temp_file(
        "payment.skey",
        r#"{
    "type": "PaymentSigningKeyShelley_ed25519",
    "description": "Payment Signing Key",
    "cborHex": "5820000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
}"#,
    );

    let mut child = signer_cmd()
        .args(["sign", "--skey-file"])
        .arg(&skey)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("cli spawns");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(UNSIGNED_TX.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("cli runs");
    assert_eq!(stdout_of(&output), SIGNED_BY_RAW);
}

#[test]
fn json_output_describes_the_witness() {
    let mnemonic = temp_file("json.mnemonic", ABANDON_ART);
    let tx_file = temp_file("unsigned.tx", UNSIGNED_TX);
    let output = signer_cmd()
        .args(["sign", "--json", "--mnemonic-file"])
        .arg(&mnemonic)
        .arg("--tx-file")
        .arg(&tx_file)
        .output()
        .expect("cli runs");

    let json: Value = serde_json::from_str(&stdout_of(&output)).expect("stdout is valid json");
    assert_eq!(json["tx_hex"], SIGNED_BY_MNEMONIC);
    assert_eq!(
        json["tx_hash"],
        "56bc81c0e6b4c582fb2a1e260efb5caab1991759c8e4693a72b8b933b32314c0"
    );
    assert_eq!(json["witness_count"], 1);
    assert_eq!(json["replaced"], false);
}

#[test]
fn pubkey_subcommand() {
    let output = signer_cmd()
        .env("CARDANO_SIGNER_MNEMONIC", ABANDON_ART)
        .args(["pubkey", "--path", "m/1852'/1815'/0'/0/1"])
        .output()
        .expect("cli runs");
    assert_eq!(
        stdout_of(&output),
        "5deb1de379c4af6cd5fb2a2fd2579b4b9a5aae2a3b7ed176f4d376bfbf25b5bf"
    );
}

#[test]
fn reports_errors_with_code_and_status() {
    let output = signer_cmd()
        .env("CARDANO_SIGNER_MNEMONIC", ABANDON_ART)
        .args(["sign", "--tx", "not-valid-hex"])
        .output()
        .expect("cli runs");

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr is utf8");
    assert!(stderr.contains("error: [malformed_transaction]"), "stderr: {}", stderr);
    assert!(!stderr.contains("abandon"), "secret leaked: {}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn requires_a_key_source() {
    let output = signer_cmd()
        .args(["sign", "--tx", UNSIGNED_TX])
        .output()
        .expect("cli runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("stderr is utf8");
    assert!(stderr.contains("error: [invalid_input] No key source given"), "stderr: {}", stderr);
}
