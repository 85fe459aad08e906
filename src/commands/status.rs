use crate::{
    cli::StatusArgs,
    error::{Error, Result},
    structs::state::ServerState,
};

pub fn status(args: StatusArgs) -> Result<()> {
    let state = ServerState::load(&args.dir)?
        .filter(|s| s.pack_id.is_some())
        .ok_or_else(|| Error::Other("No .mcserver/state.json found in this folder".into()))?;

    print!("{}", format_status(&state));
    Ok(())
}

fn or_none<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map_or("None".into(), |v| v.to_string())
}

fn format_status(state: &ServerState) -> String {
    format!(
        "packId={}\ninstalledFileId={}\ninstalledDisplayName={}\nlastUpdatedAt={}\n",
        or_none(&state.pack_id),
        or_none(&state.installed_file_id),
        or_none(&state.installed_display_name),
        or_none(&state.last_updated_at),
    )
}
