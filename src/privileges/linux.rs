/// Check if the process is running as root
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Supplementary group IDs of the process, if they can be read
pub fn supplementary_groups() -> Option<Vec<u32>> {
    // First call with a zero-sized buffer returns the group count
    let count = unsafe { libc::getgroups(0, std::ptr::null_mut()) };
    if count < 0 {
        return None;
    }

    let mut groups: Vec<libc::gid_t> = vec![0; count as usize];
    let written = unsafe { libc::getgroups(count, groups.as_mut_ptr()) };
    if written < 0 {
        return None;
    }
    groups.truncate(written as usize);

    Some(groups.into_iter().map(|g| g as u32).collect())
}
