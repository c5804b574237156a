use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(out_path) = param_str(req, "outPath").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing outPath", None);
    };

    match backup::export_workspace_bundle(&workspace, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "sha256": summary.sha256,
                "outPath": out_path.to_string_lossy()
            }),
        ),
        Err(e) => err(&req.id, "backup_failed", format!("{e:?}"), None),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(in_path) = param_str(req, "inPath").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing inPath", None);
    };
    let Some(workspace) = param_str(req, "path").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing path", None);
    };

    let summary = match backup::import_workspace_bundle(&in_path, &workspace) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "backup_failed", format!("{e:?}"), None),
    };

    // Load the restored store so the caller can keep working immediately.
    match store::open_store(&workspace) {
        Ok(db) => {
            let class_count = db.classes.len();
            state.workspace = Some(workspace);
            state.db = Some(db);
            ok(
                &req.id,
                json!({
                    "bundleFormatDetected": summary.bundle_format_detected,
                    "classCount": class_count
                }),
            )
        }
        Err(e) => err(&req.id, "store_load_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
