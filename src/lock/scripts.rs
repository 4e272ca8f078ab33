use crate::script::Script;

/// `KEYS[1]` lock key, `ARGV[1]` token, `ARGV[2]` lease in ms.
/// Returns 1 when the key was absent and is now owned by the token.
pub const ACQUIRE: Script = Script::new(
    "lock.acquire",
    r#"
if redis.call('set', KEYS[1], ARGV[1], 'NX', 'PX', ARGV[2]) then
    return 1
end
return 0
"#,
);

/// `KEYS[1]` lock key, `ARGV[1]` owner prefix, `ARGV[2]` lease in ms.
/// Returns 1 and resets the lease when the holder shares the owner prefix.
pub const REENTER: Script = Script::new(
    "lock.reenter",
    r#"
local holder = redis.call('get', KEYS[1])
if holder and string.sub(holder, 1, string.len(ARGV[1])) == ARGV[1] then
    redis.call('pexpire', KEYS[1], ARGV[2])
    return 1
end
return 0
"#,
);

/// `KEYS[1]` lock key, `ARGV[1]` token, `ARGV[2]` lease in ms.
/// Returns 1 and resets the lease only when the token still owns the key.
pub const RENEW: Script = Script::new(
    "lock.renew",
    r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    redis.call('pexpire', KEYS[1], ARGV[2])
    return 1
end
return 0
"#,
);

/// `KEYS[1]` lock key, `ARGV[1]` token.
/// Returns 1 when the key was deleted because the token owned it.
pub const RELEASE: Script = Script::new(
    "lock.release",
    r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
end
return 0
"#,
);

/// `KEYS[1]` lock key. Returns the current holder token or nil.
pub const OWNER: Script = Script::new(
    "lock.owner",
    r#"
return redis.call('get', KEYS[1])
"#,
);
