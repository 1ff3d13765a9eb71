//
// setters.rs - Setter methods for PolicyContract
//

use super::*;
use neo_vm::StackItem;

/// Reads argument 0 as an integer within `min..=max`.
fn ranged(args: &NativeArgs, min: i64, max: i64, what: &str) -> Result<i64> {
    let value = args.integer(0)?;
    value
        .to_i64()
        .filter(|value| (min..=max).contains(value))
        .ok_or_else(|| Error::invalid_argument(format!("{what} {value} is outside {min}..={max}")))
}

impl PolicyContract {
    pub(super) fn set_fee_per_byte(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let value = ranged(args, 0, MAX_FEE_PER_BYTE, "FeePerByte")?;
        assert_committee(host, engine)?;
        put_i64(host.snapshot_mut(), PREFIX_FEE_PER_BYTE, value);
        Ok(NativeValue::Void)
    }

    pub(super) fn set_exec_fee_factor(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let value = ranged(args, 1, MAX_EXEC_FEE_FACTOR, "ExecFeeFactor")?;
        assert_committee(host, engine)?;
        put_i64(host.snapshot_mut(), PREFIX_EXEC_FEE_FACTOR, value);
        Ok(NativeValue::Void)
    }

    pub(super) fn set_storage_price(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let value = ranged(args, 1, MAX_STORAGE_PRICE, "StoragePrice")?;
        assert_committee(host, engine)?;
        put_i64(host.snapshot_mut(), PREFIX_STORAGE_PRICE, value);
        Ok(NativeValue::Void)
    }

    pub(super) fn set_milliseconds_per_block(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let value = ranged(args, 1, MAX_MILLISECONDS_PER_BLOCK, "MillisecondsPerBlock")?;
        assert_committee(host, engine)?;
        let default = i64::from(host.settings().milliseconds_per_block);
        let old = read_i64(host.snapshot(), PREFIX_MILLISECONDS_PER_BLOCK, default);
        put_i64(host.snapshot_mut(), PREFIX_MILLISECONDS_PER_BLOCK, value);
        host.send_notification(
            engine,
            native_hash(NAME),
            "MillisecondsPerBlockChanged",
            vec![StackItem::from_int(old), StackItem::from_int(value)],
        );
        Ok(NativeValue::Void)
    }

    pub(super) fn set_max_valid_until_block_increment(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let value = ranged(args, 1, MAX_MAX_VALID_UNTIL_BLOCK_INCREMENT, "MaxValidUntilBlockIncrement")?;
        let traceable = read_i64(
            host.snapshot(),
            PREFIX_MAX_TRACEABLE_BLOCKS,
            i64::from(host.settings().max_traceable_blocks),
        );
        if value >= traceable {
            return Err(Error::invalid_argument(format!(
                "MaxValidUntilBlockIncrement must be lower than MaxTraceableBlocks ({traceable})"
            )));
        }
        assert_committee(host, engine)?;
        put_i64(host.snapshot_mut(), PREFIX_MAX_VALID_UNTIL_BLOCK_INCREMENT, value);
        Ok(NativeValue::Void)
    }

    pub(super) fn set_max_traceable_blocks(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let value = ranged(args, 1, MAX_MAX_TRACEABLE_BLOCKS, "MaxTraceableBlocks")?;
        let old = read_i64(
            host.snapshot(),
            PREFIX_MAX_TRACEABLE_BLOCKS,
            i64::from(host.settings().max_traceable_blocks),
        );
        if value > old {
            return Err(Error::invalid_argument(format!(
                "MaxTraceableBlocks can not be increased (old {old}, new {value})"
            )));
        }
        let increment = max_valid_until_block_increment(host.snapshot(), host.settings());
        if value <= increment {
            return Err(Error::invalid_argument(format!(
                "MaxTraceableBlocks must be larger than MaxValidUntilBlockIncrement ({increment})"
            )));
        }
        assert_committee(host, engine)?;
        put_i64(host.snapshot_mut(), PREFIX_MAX_TRACEABLE_BLOCKS, value);
        Ok(NativeValue::Void)
    }

    pub(super) fn set_attribute_fee(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let attribute = AttributeType::from_argument(host, &args.integer(0)?)?;
        let value = args.integer(1)?;
        let fee = value
            .to_i64()
            .filter(|fee| (0..=MAX_ATTRIBUTE_FEE).contains(fee))
            .ok_or_else(|| Error::invalid_argument(format!("attribute fee {value} is out of range")))?;
        assert_committee(host, engine)?;
        host.snapshot_mut()
            .put(attribute_fee_key(attribute), StorageItem::from_i64(fee));
        Ok(NativeValue::Void)
    }

    pub(super) fn block_account(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let account = args.hash160(0)?;
        assert_committee(host, engine)?;
        if host.natives().is_native(&account) {
            return Err(Error::invalid_operation("cannot block a native contract"));
        }
        let key = blocked_key(&account);
        if host.snapshot().contains(&key) {
            return Ok(false.into());
        }
        host.snapshot_mut().put(key, StorageItem::default());
        Ok(true.into())
    }

    pub(super) fn unblock_account(
        host: &mut EngineHost,
        engine: &mut ExecutionEngine,
        args: &NativeArgs,
    ) -> Result<NativeValue> {
        let account = args.hash160(0)?;
        assert_committee(host, engine)?;
        let key = blocked_key(&account);
        if !host.snapshot().contains(&key) {
            return Ok(false.into());
        }
        host.snapshot_mut().delete(&key);
        Ok(true.into())
    }
}
