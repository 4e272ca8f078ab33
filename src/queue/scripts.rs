use crate::script::Script;

/// `KEYS[1]` list, `ARGV[1]` payload. Returns the new list length.
pub const PUSH: Script = Script::new(
    "queue.push",
    r#"
return redis.call('rpush', KEYS[1], ARGV[1])
"#,
);

/// `KEYS[1]` list. Returns the oldest payload or nil.
pub const POP: Script = Script::new(
    "queue.pop",
    r#"
return redis.call('lpop', KEYS[1])
"#,
);

/// `KEYS[1]` list. Returns the list length.
pub const LEN: Script = Script::new(
    "queue.len",
    r#"
return redis.call('llen', KEYS[1])
"#,
);

/// `KEYS[1]` sorted set, `ARGV[1]` payload, `ARGV[2]` ready-at seconds.
/// Returns 1 for a new payload, 0 when an existing payload was rescheduled.
pub const DELAYED_PUSH: Script = Script::new(
    "queue.delayed_push",
    r#"
return redis.call('zadd', KEYS[1], ARGV[2], ARGV[1])
"#,
);

/// `KEYS[1]` sorted set, `ARGV[1]` now in seconds.
/// Removes and returns the lowest-scored payload if it is due, else nil.
pub const DELAYED_POP: Script = Script::new(
    "queue.delayed_pop",
    r#"
local head = redis.call('zrange', KEYS[1], 0, 0, 'WITHSCORES')
if #head == 0 then
    return nil
end
if tonumber(head[2]) > tonumber(ARGV[1]) then
    return nil
end
redis.call('zrem', KEYS[1], head[1])
return head[1]
"#,
);

/// `KEYS[1]` sorted set, `ARGV[1]` payload. Returns the number removed.
pub const DELAYED_REMOVE: Script = Script::new(
    "queue.delayed_remove",
    r#"
return redis.call('zrem', KEYS[1], ARGV[1])
"#,
);

/// `KEYS[1]` sorted set. Returns its cardinality.
pub const DELAYED_LEN: Script = Script::new(
    "queue.delayed_len",
    r#"
return redis.call('zcard', KEYS[1])
"#,
);

/// `KEYS[*]` every key backing a queue name. Returns the number deleted.
pub const DESTROY: Script = Script::new(
    "queue.destroy",
    r#"
return redis.call('del', unpack(KEYS))
"#,
);
