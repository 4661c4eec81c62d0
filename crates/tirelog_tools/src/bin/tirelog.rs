#![forbid(unsafe_code)]

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read};

use tirelog_contracts::auth::{Role, Session};
use tirelog_contracts::tire::TireId;
use tirelog_engines::attachment::{AttachmentConfig, AttachmentRuntime};
use tirelog_os::{authz, lifecycle, transfer};
use tirelog_storage::store::TireStore;
use tirelog_tools::ops_cli::{
    default_store_path, format_record, format_row, now, parse_args, parse_stroke_points,
};

const USAGE: &str = "usage: tirelog <set-pin|list|show|create|update|move|delete|photo|sign|export|import> [args] [--role <view|add|edit|admin>] [--pin <pin>]";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        return Err(USAGE.to_string());
    };
    let parsed = parse_args(rest)?;

    let mut store = TireStore::open(default_store_path()).map_err(|e| e.to_string())?;

    match command.as_str() {
        "set-pin" => {
            let pin = match parsed.pin {
                Some(pin) => pin,
                None => read_secret("New admin PIN:")?,
            };
            authz::set_credential(&mut store, &pin).map_err(|e| e.to_string())?;
            println!("PIN saved");
        }
        "list" => {
            let rows = lifecycle::list_filtered(
                &store,
                parsed.query.as_deref(),
                parsed.condition,
                parsed.category,
            );
            for record in rows {
                println!("{}", format_row(record));
            }
        }
        "show" => {
            let id = require_id(&parsed.positional)?;
            let record =
                lifecycle::find(&store, &id).ok_or_else(|| format!("no record with id {}", id.as_str()))?;
            print!("{}", format_record(record));
        }
        "create" => {
            let id = require_id(&parsed.positional)?;
            let session = login(&store, &parsed.role, &parsed.pin, Role::Add)?;
            let record = lifecycle::create(&session, &mut store, id, parsed.fields, now())
                .map_err(|e| e.to_string())?;
            println!("created {}", record.id.as_str());
        }
        "update" => {
            let id = require_id(&parsed.positional)?;
            let session = login(&store, &parsed.role, &parsed.pin, Role::Edit)?;
            let record = lifecycle::update(&session, &mut store, &id, parsed.fields, now())
                .map_err(|e| e.to_string())?;
            println!("updated {}", record.id.as_str());
        }
        "move" => {
            let id = require_id(&parsed.positional)?;
            let location = parsed
                .positional
                .get(1)
                .ok_or("usage: tirelog move <id> <location> <position>")?;
            let position = parsed
                .positional
                .get(2)
                .ok_or("usage: tirelog move <id> <location> <position>")?;
            let session = login(&store, &parsed.role, &parsed.pin, Role::Edit)?;
            let record =
                lifecycle::relocate(&session, &mut store, &id, location, position, now())
                    .map_err(|e| e.to_string())?;
            println!("moved {} to {} {}", record.id.as_str(), record.location, record.position);
        }
        "delete" => {
            let id = require_id(&parsed.positional)?;
            let session = login(&store, &parsed.role, &parsed.pin, Role::Admin)?;
            lifecycle::delete(&session, &mut store, &id).map_err(|e| e.to_string())?;
            println!("deleted {}", id.as_str());
        }
        "photo" => {
            let id = require_id(&parsed.positional)?;
            let file = parsed
                .positional
                .get(1)
                .ok_or("usage: tirelog photo <id> <image-file>")?;
            let raw = fs::read(file).map_err(|e| format!("cannot read {file}: {e}"))?;
            let runtime = AttachmentRuntime::new(AttachmentConfig::default_v1());
            let artifact = runtime.capture_image(&raw).map_err(|e| e.to_string())?;
            let session = login(&store, &parsed.role, &parsed.pin, Role::Add)?;
            let record = lifecycle::add_photo(&session, &mut store, &id, artifact, now())
                .map_err(|e| e.to_string())?;
            println!("photo added to {} ({} total)", record.id.as_str(), record.photos.len());
        }
        "sign" => {
            let id = require_id(&parsed.positional)?;
            let file = parsed
                .positional
                .get(1)
                .ok_or("usage: tirelog sign <id> <points-file>")?;
            let raw =
                fs::read_to_string(file).map_err(|e| format!("cannot read {file}: {e}"))?;
            let points = parse_stroke_points(&raw)?;
            if points.is_empty() {
                return Err("nothing drawn: the points file is empty".to_string());
            }
            let runtime = AttachmentRuntime::new(AttachmentConfig::default_v1());
            let artifact = runtime.capture_signature(&points).map_err(|e| e.to_string())?;
            let session = login(&store, &parsed.role, &parsed.pin, Role::Add)?;
            lifecycle::attach_signature(&session, &mut store, &id, artifact, now())
                .map_err(|e| e.to_string())?;
            println!("signature attached to {}", id.as_str());
        }
        "export" => {
            let document = transfer::export_json(&store).map_err(|e| e.to_string())?;
            match parsed.positional.first() {
                Some(file) => {
                    fs::write(file, &document).map_err(|e| format!("cannot write {file}: {e}"))?;
                    println!("exported {} records to {file}", store.tire_count());
                }
                None => println!("{document}"),
            }
        }
        "import" => {
            let file = parsed
                .positional
                .first()
                .ok_or("usage: tirelog import <file>")?;
            let raw =
                fs::read_to_string(file).map_err(|e| format!("cannot read {file}: {e}"))?;
            let count = transfer::import_json(&mut store, &raw).map_err(|e| e.to_string())?;
            println!("imported {count} records");
        }
        other => return Err(format!("unknown command: {other}. {USAGE}")),
    }
    Ok(())
}

fn require_id(positional: &[String]) -> Result<TireId, String> {
    let raw = positional.first().ok_or("missing record id")?;
    TireId::new(raw.as_str()).map_err(|e| e.to_string())
}

/// Elevates a fresh session to the requested role (or the command's
/// default), prompting for the PIN only when the gate will check it.
fn login(
    store: &TireStore,
    role: &Option<Role>,
    pin: &Option<String>,
    default_role: Role,
) -> Result<Session, String> {
    let wanted = role.unwrap_or(default_role);
    let needs_secret = matches!(wanted, Role::Admin | Role::Edit)
        && store.get_setting(authz::ADMIN_HASH_KEY).is_some();
    let secret = if needs_secret {
        match pin {
            Some(pin) => pin.clone(),
            None => read_secret(&format!("PIN for {}:", wanted.label()))?,
        }
    } else {
        String::new()
    };
    let mut session = Session::default();
    authz::request_role(&mut session, store, wanted, &secret).map_err(|e| e.to_string())?;
    Ok(session)
}

fn read_secret(prompt: &str) -> Result<String, String> {
    if io::stdin().is_terminal() {
        let value = rpassword::prompt_password(prompt).map_err(|e| e.to_string())?;
        if value.trim().is_empty() {
            return Err("PIN must not be empty".to_string());
        }
        Ok(value)
    } else {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| e.to_string())?;
        let trimmed = input.trim().to_string();
        if trimmed.is_empty() {
            return Err("PIN must not be empty".to_string());
        }
        Ok(trimmed)
    }
}
